mod context;
pub mod economy;
pub mod events;
pub mod market;
mod runner;
mod signal;
mod system;
pub mod territory;

pub use context::TickContext;
pub use economy::EconomicIndexSystem;
pub use events::{EventExpirySystem, NewEvent};
pub use market::{MarketSystem, TradeQuote};
pub use runner::{Scheduler, SchedulerTask, should_fire};
pub use signal::{Signal, SignalBus};
pub use system::SimSystem;
pub use territory::TerritoryControlChange;
