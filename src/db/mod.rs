mod cache;
mod ledger;
mod migrate;
pub mod snapshot;

pub use cache::{Cache, MemoryCache, PgCache};
pub use ledger::{Ledger, MemoryLedger, PgLedger};
pub use migrate::{migrate, purge_expired_cache};
