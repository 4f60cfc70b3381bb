//! Run the world simulation against in-memory backends for a while and print
//! where it ended up.
//!
//! Usage: `gang_sim [config.json] [seconds]`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gang_sim::db::{MemoryCache, MemoryLedger};
use gang_sim::model::EconomicEvent;
use gang_sim::{Clock, SimConfig, SystemClock, TradeOutcome, WorldService};
use tracing_subscriber::EnvFilter;

fn load_config(path: Option<PathBuf>) -> Result<SimConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(SimConfig::from_json_str(&std::fs::read_to_string(path)?)?),
        None => Ok(SimConfig {
            event_sweep_secs: 2,
            price_update_secs: 1,
            economic_recompute_secs: 3,
            ..SimConfig::default()
        }),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = load_config(args.next().map(PathBuf::from))?;
    let seconds: u64 = match args.next() {
        Some(s) => s.parse()?,
        None => 10,
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger = Arc::new(MemoryLedger::new().with_player("demo_player", 5_000.0));
    ledger.push_economic_event(EconomicEvent::new("port strike", 0.03, clock.now()));

    let service = WorldService::start(
        config,
        Arc::new(MemoryCache::new()),
        ledger.clone(),
        clock.clone(),
    )
    .await;

    let mut signals = service.subscribe();
    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            tracing::info!(signal = signal.name(), "signal");
        }
    });

    service.spawn_scheduler();

    service.update_territory_control("port", "ballas").await?;
    service.trigger_faction_conflict("families", "ballas", "grove_street")?;
    let outcome = TradeOutcome::from(service.purchase_item("demo_player", "weed", 3).await);
    println!("purchase: {}", serde_json::to_string(&outcome)?);

    tokio::time::sleep(Duration::from_secs(seconds)).await;

    for item in service.get_market_items() {
        println!(
            "{:<14} price={:>9.2} supply={:>5.1} demand={:>5.1}",
            item.id, item.current_price, item.supply, item.demand
        );
    }
    if let Some(econ) = service.get_economic_state() {
        println!(
            "economy: weapons={:.1} police={:.1} level={:?} crime={:?}",
            econ.weapon_availability,
            econ.law_enforcement_activity,
            service.get_economic_level(),
            service.get_crime_level()
        );
    }
    println!("inflation: {:.3}", service.calculate_inflation().await);
    println!("active events: {}", service.get_active_events().len());

    service.cleanup().await;
    Ok(())
}
