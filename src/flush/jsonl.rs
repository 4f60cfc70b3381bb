use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::db::snapshot::WorldSnapshot;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Dump a state snapshot as JSONL files in `output_dir`, creating it if needed.
///
/// Writes `territories.jsonl`, `events.jsonl`, `market.jsonl`, and
/// `economic_state.jsonl` (empty when there is no economic state yet).
/// Existing files are overwritten.
pub fn flush_to_jsonl(snapshot: &WorldSnapshot, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(
        &output_dir.join("territories.jsonl"),
        snapshot.territories.iter(),
    )?;
    write_jsonl(&output_dir.join("events.jsonl"), snapshot.events.iter())?;
    write_jsonl(&output_dir.join("market.jsonl"), snapshot.market.iter())?;
    write_jsonl(
        &output_dir.join("economic_state.jsonl"),
        snapshot.economic.iter(),
    )?;

    Ok(())
}
