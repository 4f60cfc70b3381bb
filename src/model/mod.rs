#[macro_use]
mod macros;

pub mod economy;
pub mod event;
pub mod market;
pub mod territory;
pub mod world;

pub use economy::{CrimeLevel, EconomicEvent, EconomicLevel, EconomicPatch, EconomicState};
pub use event::{EventLocation, Severity, WorldEvent, WorldEventKind};
pub use market::{ItemCategory, MarketItem, Transaction, TransactionKind};
pub use territory::{Bounds, Territory};
pub use world::{SharedState, SimState};
