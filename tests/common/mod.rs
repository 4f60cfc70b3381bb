#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gang_sim::db::{Ledger, MemoryCache, MemoryLedger};
use gang_sim::model::*;
use gang_sim::{LedgerError, ManualClock, SimConfig, WorldService};

pub const PLAYER: &str = "player_1";
pub const ITEM: &str = "test_item";

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn build_test_state(now: DateTime<Utc>) -> SimState {
    let mut state = SimState::new();

    // 2 territories: a strategic dock held by the families, an open alley
    let docks = Territory::new("docks", "Docks", Bounds::new(0.0, 0.0, 100.0, 100.0).unwrap(), 12_000.0, now)
        .unwrap()
        .strategic()
        .controlled_by("families");
    let alley = Territory::new("alley", "Back Alley", Bounds::new(200.0, 0.0, 300.0, 100.0).unwrap(), 800.0, now)
        .unwrap();
    state.insert_territory(docks);
    state.insert_territory(alley);

    // 2 items: the trading subject at 120 and a weapon feeding the indices
    state.insert_item(MarketItem::new(ITEM, "Test Item", ItemCategory::Drug, 120.0, 0.2, now));
    state.insert_item(
        MarketItem::new("rifle", "Rifle", ItemCategory::Weapon, 1_500.0, 0.1, now).with_market(30.0, 60.0),
    );

    state.economic = Some(EconomicState {
        drug_prices: [(ITEM.to_string(), 120.0)].into_iter().collect(),
        weapon_availability: 50.0,
        law_enforcement_activity: 50.0,
        tourist_activity: 60.0,
        business_activity: 55.0,
        last_update: now,
    });
    state
}

pub struct TestWorld {
    pub service: WorldService,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<MemoryCache>,
    pub ledger: Arc<MemoryLedger>,
}

/// Ledger whose journal rejects every write while balances keep working.
pub struct JournalDown(pub Arc<MemoryLedger>);

#[async_trait]
impl Ledger for JournalDown {
    async fn balance(&self, player_id: &str) -> Result<f64, LedgerError> {
        self.0.balance(player_id).await
    }

    async fn adjust_balance(&self, player_id: &str, delta: f64) -> Result<f64, LedgerError> {
        self.0.adjust_balance(player_id, delta).await
    }

    async fn record_transaction(&self, _transaction: &Transaction) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("journal is down".to_string()))
    }

    async fn last_transaction_id(&self) -> Result<u64, LedgerError> {
        self.0.last_transaction_id().await
    }

    async fn recent_economic_events(&self, limit: usize) -> Result<Vec<EconomicEvent>, LedgerError> {
        self.0.recent_economic_events(limit).await
    }
}

pub fn build_test_world() -> TestWorld {
    build_test_world_with(SimConfig::default())
}

pub fn build_test_world_with(config: SimConfig) -> TestWorld {
    let ledger = Arc::new(MemoryLedger::new().with_player(PLAYER, 1_000.0));
    build_world(config, ledger.clone(), ledger)
}

/// Same world, but journal writes fail. `ledger` still exposes the balances.
pub fn build_test_world_with_broken_journal() -> TestWorld {
    let ledger = Arc::new(MemoryLedger::new().with_player(PLAYER, 1_000.0));
    build_world(SimConfig::default(), Arc::new(JournalDown(ledger.clone())), ledger)
}

fn build_world(config: SimConfig, service_ledger: Arc<dyn Ledger>, ledger: Arc<MemoryLedger>) -> TestWorld {
    let clock = Arc::new(ManualClock::new(start_time()));
    let cache = Arc::new(MemoryCache::new());
    let service = WorldService::from_state(
        build_test_state(start_time()),
        config,
        cache.clone(),
        service_ledger,
        clock.clone(),
    );
    TestWorld {
        service,
        clock,
        cache,
        ledger,
    }
}
