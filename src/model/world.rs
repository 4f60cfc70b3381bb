use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::economy::EconomicState;
use super::event::WorldEvent;
use super::market::MarketItem;
use super::territory::Territory;
use crate::id::IdGenerator;

/// Simulation state shared between the scheduler task and request handlers.
///
/// Locked only for synchronous sections; never held across an `.await`.
pub type SharedState = Arc<Mutex<SimState>>;

/// All in-process simulation state, owned in one place.
///
/// Maps are ordered so lookups that return "the first match" and every
/// snapshot are deterministic.
#[derive(Debug, Default)]
pub struct SimState {
    pub territories: BTreeMap<String, Territory>,
    pub events: BTreeMap<u64, WorldEvent>,
    /// `None` until seeded; patches against a missing state are no-ops.
    pub economic: Option<EconomicState>,
    pub market: BTreeMap<String, MarketItem>,
    pub id_gen: IdGenerator,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_territory(&mut self, territory: Territory) {
        self.territories.insert(territory.id.clone(), territory);
    }

    pub fn insert_item(&mut self, item: MarketItem) {
        self.market.insert(item.id.clone(), item);
    }

    /// Insert a restored event and keep the id generator ahead of it.
    pub fn restore_event(&mut self, event: WorldEvent) {
        self.id_gen.advance_past(event.id);
        self.events.insert(event.id, event);
    }
}
