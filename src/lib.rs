pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod flush;
pub mod id;
pub mod model;
pub mod service;
pub mod sim;
pub mod worldgen;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SimConfig;
pub use error::{CacheError, LedgerError, TradeError, WorldError};
pub use id::IdGenerator;
pub use service::{TradeOutcome, TradeReceipt, WorldService};
pub use sim::{Signal, SignalBus};
