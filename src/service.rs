//! Async facade over the simulation: owns the shared state, the tick task
//! and the collaborators (cache, ledger, notification bus).

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::clock::Clock;
use crate::config::SimConfig;
use crate::db::snapshot::{WorldSnapshot, hydrate_state, save_snapshot, save_territories};
use crate::db::{Cache, Ledger};
use crate::error::{CacheError, LedgerError, TradeError, WorldError};
use crate::model::{
    CrimeLevel, EconomicLevel, EconomicPatch, EconomicState, MarketItem, SharedState, SimState,
    Territory, Transaction, TransactionKind, WorldEvent,
};
use crate::sim::events::NewEvent;
use crate::sim::market::TradeQuote;
use crate::sim::{
    Scheduler, SchedulerTask, Signal, SignalBus, economy, events, market, territory,
};

/// How many economic events feed the inflation estimate.
const INFLATION_WINDOW: usize = 50;

/// A settled trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    pub transaction: Transaction,
    pub new_balance: f64,
}

/// Wire shape of a trade result: `{success: false, error}` for business
/// failures instead of a transport-level fault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<f64>,
}

impl From<Result<TradeReceipt, TradeError>> for TradeOutcome {
    fn from(result: Result<TradeReceipt, TradeError>) -> Self {
        match result {
            Ok(receipt) => Self {
                success: true,
                error: None,
                new_balance: Some(receipt.new_balance),
                transaction: Some(receipt.transaction),
            },
            Err(err) => Self {
                success: false,
                error: Some(err.to_string()),
                transaction: None,
                new_balance: None,
            },
        }
    }
}

struct RunningScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct WorldService {
    state: SharedState,
    config: Arc<SimConfig>,
    clock: Arc<dyn Clock>,
    bus: SignalBus,
    cache: Arc<dyn Cache>,
    ledger: Arc<dyn Ledger>,
    runner: Mutex<Option<RunningScheduler>>,
}

fn ledger_failure(err: LedgerError) -> TradeError {
    if !matches!(err, LedgerError::PlayerNotFound(_)) {
        tracing::warn!(error = %err, "ledger call failed");
    }
    err.into()
}

impl WorldService {
    /// Hydrate from the cache (falling back to seed data) and build the
    /// service. The scheduler is not started; see `spawn_scheduler`.
    pub async fn start(
        config: SimConfig,
        cache: Arc<dyn Cache>,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut state = hydrate_state(cache.as_ref(), clock.now()).await;
        match ledger.last_transaction_id().await {
            Ok(last) => state.id_gen.advance_past(last),
            Err(err) => tracing::warn!(error = %err, "could not read last transaction id"),
        }
        Self::from_state(state, config, cache, ledger, clock)
    }

    pub fn from_state(
        state: SimState,
        config: SimConfig,
        cache: Arc<dyn Cache>,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            config: Arc::new(config),
            clock,
            bus: SignalBus::new(),
            cache,
            ledger,
            runner: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Signal> {
        self.bus.subscribe()
    }

    /// Run `f` against the locked state, then publish whatever it emitted.
    fn mutate<R>(&self, f: impl FnOnce(&mut SimState, &mut Vec<Signal>) -> R) -> R {
        let mut signals = Vec::new();
        let result = {
            let mut state = self.state.lock();
            f(&mut state, &mut signals)
        };
        self.bus.emit_all(signals);
        result
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.state.lock())
    }

    /// Write the whole state to the cache now.
    pub async fn checkpoint(&self) -> Result<(), CacheError> {
        let snapshot = self.snapshot();
        save_snapshot(self.cache.as_ref(), &snapshot, self.config.cache_ttl_secs).await
    }

    // -- Territories ---------------------------------------------------------

    pub fn get_territory(&self, id: &str) -> Option<Territory> {
        territory::get_territory(&self.state.lock(), id).cloned()
    }

    pub fn get_all_territories(&self) -> Vec<Territory> {
        territory::all_territories(&self.state.lock())
    }

    pub fn get_territory_at_position(&self, x: f64, y: f64) -> Option<Territory> {
        territory::territory_at_position(&self.state.lock(), x, y).cloned()
    }

    pub fn is_in_contested_territory(&self, x: f64, y: f64) -> bool {
        territory::is_in_contested_territory(&self.state.lock(), x, y)
    }

    pub fn get_territories_controlled_by(&self, faction_id: &str) -> Vec<Territory> {
        territory::territories_controlled_by(&self.state.lock(), faction_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Assign control, notify subscribers, then checkpoint territories.
    /// A failed checkpoint is logged; the in-memory update stands.
    pub async fn update_territory_control(
        &self,
        territory_id: &str,
        faction_id: &str,
    ) -> Result<Territory, WorldError> {
        let now = self.clock.now();
        let (change, territories) = self.mutate(|state, signals| {
            let change =
                territory::update_territory_control(state, territory_id, faction_id, now, signals)?;
            Ok::<_, WorldError>((change, territory::all_territories(state)))
        })?;

        if let Err(err) =
            save_territories(self.cache.as_ref(), &territories, self.config.cache_ttl_secs).await
        {
            tracing::warn!(territory = territory_id, error = %err, "territory checkpoint failed");
        }
        Ok(change.territory)
    }

    pub fn trigger_faction_conflict(
        &self,
        attacker: &str,
        defender: &str,
        territory_id: &str,
    ) -> Result<WorldEvent, WorldError> {
        let now = self.clock.now();
        self.mutate(|state, signals| {
            events::trigger_faction_conflict(state, attacker, defender, territory_id, now, signals)
        })
    }

    // -- Events --------------------------------------------------------------

    pub fn create_event(&self, params: NewEvent) -> WorldEvent {
        let now = self.clock.now();
        self.mutate(|state, signals| events::create_event(state, params, now, signals))
    }

    pub fn get_events_at_location(&self, x: f64, y: f64, z: f64) -> Vec<WorldEvent> {
        events::events_at_location(&self.state.lock(), x, y, z)
    }

    pub fn get_active_events(&self) -> Vec<WorldEvent> {
        events::active_events(&self.state.lock())
    }

    /// Run the expiry sweep now, outside the regular schedule.
    pub fn process_active_events(&self) -> Vec<u64> {
        let now = self.clock.now();
        self.mutate(|state, signals| events::process_active_events(state, now, signals))
    }

    // -- Economy -------------------------------------------------------------

    pub fn get_economic_state(&self) -> Option<EconomicState> {
        self.state.lock().economic.clone()
    }

    pub fn update_economic_state(&self, patch: EconomicPatch) -> bool {
        let now = self.clock.now();
        self.mutate(|state, signals| economy::update_economic_state(state, patch, now, signals))
    }

    pub fn get_economic_level(&self) -> Option<EconomicLevel> {
        let state = self.state.lock();
        let econ = state.economic.as_ref()?;
        Some(economy::economic_level(econ, &self.config.thresholds))
    }

    pub fn get_crime_level(&self) -> Option<CrimeLevel> {
        let state = self.state.lock();
        let econ = state.economic.as_ref()?;
        Some(economy::crime_level(econ, &self.config.thresholds))
    }

    /// Inflation from the ledger's recent economic events; the default rate
    /// if the history cannot be read.
    pub async fn calculate_inflation(&self) -> f64 {
        match self.ledger.recent_economic_events(INFLATION_WINDOW).await {
            Ok(events) => economy::calculate_inflation(&events),
            Err(err) => {
                tracing::warn!(error = %err, "economic history unavailable; using default inflation");
                economy::DEFAULT_INFLATION
            }
        }
    }

    // -- Market --------------------------------------------------------------

    pub fn get_market_item(&self, item_id: &str) -> Option<MarketItem> {
        self.state.lock().market.get(item_id).cloned()
    }

    pub fn get_market_items(&self) -> Vec<MarketItem> {
        self.state.lock().market.values().cloned().collect()
    }

    /// Journal a trade whose balance change (`delta`) has already been
    /// applied, then queue its volume on the market.
    ///
    /// If the journal write fails the balance change is reversed and the
    /// market is left alone, so a failed trade moves nothing.
    async fn settle(
        &self,
        player_id: &str,
        quote: &TradeQuote,
        kind: TransactionKind,
        delta: f64,
    ) -> Result<Transaction, TradeError> {
        let transaction = Transaction {
            id: self.state.lock().id_gen.next_id(),
            player_id: player_id.to_string(),
            item_id: quote.item_id.clone(),
            kind,
            quantity: quote.quantity,
            unit_price: quote.unit_price,
            total: quote.total,
            created_at: self.clock.now(),
        };

        if let Err(err) = self.ledger.record_transaction(&transaction).await {
            if let Err(reversal) = self.ledger.adjust_balance(player_id, -delta).await {
                tracing::error!(
                    player = player_id,
                    amount = delta,
                    error = %reversal,
                    "could not reverse balance after failed journal write"
                );
            }
            return Err(ledger_failure(err));
        }

        let mut state = self.state.lock();
        match kind {
            TransactionKind::Purchase => market::record_purchase(&mut state, quote),
            TransactionKind::Sale => market::record_sale(&mut state, quote),
        }
        Ok(transaction)
    }

    /// Buy `quantity` units at the current price.
    ///
    /// The quantity is taken as given; zero units cost nothing and succeed.
    pub async fn purchase_item(
        &self,
        player_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<TradeReceipt, TradeError> {
        let quote = market::quote_purchase(&self.state.lock(), item_id, quantity)?;

        let balance = self.ledger.balance(player_id).await.map_err(ledger_failure)?;
        if balance < quote.total {
            return Err(TradeError::InsufficientFunds);
        }
        let new_balance = self
            .ledger
            .adjust_balance(player_id, -quote.total)
            .await
            .map_err(ledger_failure)?;

        let transaction = self
            .settle(player_id, &quote, TransactionKind::Purchase, -quote.total)
            .await?;

        tracing::info!(player = player_id, item = item_id, quantity, total = quote.total, "item purchased");
        self.bus.emit(Signal::ItemPurchased {
            player_id: player_id.to_string(),
            item_id: item_id.to_string(),
            quantity,
            total: quote.total,
        });
        Ok(TradeReceipt {
            transaction,
            new_balance,
        })
    }

    /// Sell `quantity` units at the current price less the dealer's cut.
    pub async fn sell_item(
        &self,
        player_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<TradeReceipt, TradeError> {
        let quote =
            market::quote_sale(&self.state.lock(), item_id, quantity, &self.config.market)?;

        let new_balance = self
            .ledger
            .adjust_balance(player_id, quote.total)
            .await
            .map_err(ledger_failure)?;

        let transaction = self
            .settle(player_id, &quote, TransactionKind::Sale, quote.total)
            .await?;

        tracing::info!(player = player_id, item = item_id, quantity, total = quote.total, "item sold");
        self.bus.emit(Signal::ItemSold {
            player_id: player_id.to_string(),
            item_id: item_id.to_string(),
            quantity,
            total: quote.total,
        });
        Ok(TradeReceipt {
            transaction,
            new_balance,
        })
    }

    // -- Scheduler -----------------------------------------------------------

    /// Start the background tick task. Returns `false` if it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_scheduler(&self) -> bool {
        let mut runner = self.runner.lock();
        if runner.is_some() {
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = SchedulerTask {
            state: self.state.clone(),
            scheduler: Scheduler::with_default_systems(&self.config, Instant::now()),
            config: self.config.clone(),
            clock: self.clock.clone(),
            bus: self.bus.clone(),
            cache: self.cache.clone(),
        };
        let handle = tokio::spawn(task.run(shutdown_rx));
        *runner = Some(RunningScheduler { shutdown, handle });
        true
    }

    pub fn is_running(&self) -> bool {
        self.runner.lock().is_some()
    }

    /// Stop the tick task and detach every subscriber. Safe to call any
    /// number of times, with or without a running scheduler.
    pub async fn cleanup(&self) {
        let running = self.runner.lock().take();
        if let Some(RunningScheduler { shutdown, handle }) = running {
            let _ = shutdown.send(true);
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "scheduler task ended abnormally");
            }
        }
        self.bus.detach_all();
    }
}
