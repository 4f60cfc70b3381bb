//! Market pricing engine: per-item price drift from supply, demand and
//! volatility, plus the state side of player trades.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};

use super::context::TickContext;
use super::signal::Signal;
use super::system::SimSystem;
use crate::config::MarketTuning;
use crate::error::TradeError;
use crate::model::{MarketItem, SimState};

const EQUILIBRIUM: f64 = 50.0;
const VOLUME_SMOOTHING: f64 = 0.2;
const PRICE_FLOOR: f64 = 0.01;

/// Combined supply/demand and noise pressure on an item's price, in [-1, 1].
///
/// Positive when demand outstrips supply. The noise term is uniform in
/// `[-volatility, volatility]` and drawn from `rng`, so a seeded RNG gives a
/// reproducible series.
pub fn market_force_change(item: &MarketItem, tuning: &MarketTuning, rng: &mut dyn RngCore) -> f64 {
    let imbalance = (item.demand - item.supply) / 100.0;
    let noise = rng.random_range(-1.0..=1.0) * item.volatility;
    let force = tuning.imbalance_weight * imbalance + tuning.noise_weight * noise;
    if force.is_nan() {
        return 0.0;
    }
    force.clamp(-1.0, 1.0)
}

/// Move the current price by `force * volatility` and keep it inside the
/// band around the base price.
pub fn apply_price_change(item: &mut MarketItem, force: f64, tuning: &MarketTuning) {
    let next = item.current_price * (1.0 + force * item.volatility);
    let floor = (item.base_price * tuning.min_price_ratio).max(PRICE_FLOOR);
    let ceiling = (item.base_price * tuning.max_price_ratio).max(floor);
    item.current_price = next.clamp(floor, ceiling);
}

/// Fold recent trading into supply and demand.
///
/// Player trades since the last tick are topped up with a random amount of
/// simulated street activity. Purchases raise demand and drain supply,
/// restocks refill supply, and both drift back toward equilibrium.
pub fn adjust_supply_demand_from_activity(
    item: &mut MarketItem,
    tuning: &MarketTuning,
    rng: &mut dyn RngCore,
) {
    let max = tuning.max_simulated_activity;
    let simulated_buys = rng.random_range(0..=max) as f64;
    let simulated_restocks = rng.random_range(0..=max) as f64;

    let bought = item.pending_purchases as f64 + simulated_buys;
    let restocked = item.pending_sales as f64 + simulated_restocks;

    item.demand += bought * tuning.demand_per_unit;
    item.supply += (restocked - bought) * tuning.supply_per_unit;
    item.demand += (EQUILIBRIUM - item.demand) * tuning.mean_reversion;
    item.supply += (EQUILIBRIUM - item.supply) * tuning.mean_reversion;
    item.clamp_levels();

    let volume = bought + restocked;
    item.average_volume += (volume - item.average_volume) * VOLUME_SMOOTHING;
    item.pending_purchases = 0;
    item.pending_sales = 0;
}

/// One full price tick over every item. Returns the number of items updated.
pub fn update_prices(
    state: &mut SimState,
    tuning: &MarketTuning,
    rng: &mut dyn RngCore,
    now: DateTime<Utc>,
) -> usize {
    for item in state.market.values_mut() {
        let force = market_force_change(item, tuning, rng);
        apply_price_change(item, force, tuning);
        adjust_supply_demand_from_activity(item, tuning, rng);
        item.last_update = now;
    }
    state.market.len()
}

/// Price and quantity for a trade, fixed before the ledger is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeQuote {
    pub item_id: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total: f64,
}

/// Quote a purchase at the current price.
///
/// The quantity is not validated: zero costs nothing and succeeds.
pub fn quote_purchase(state: &SimState, item_id: &str, quantity: i64) -> Result<TradeQuote, TradeError> {
    let item = state.market.get(item_id).ok_or(TradeError::ItemNotFound)?;
    Ok(TradeQuote {
        item_id: item.id.clone(),
        quantity,
        unit_price: item.current_price,
        total: item.current_price * quantity as f64,
    })
}

/// Quote a sale at the current price less the dealer's cut.
pub fn quote_sale(
    state: &SimState,
    item_id: &str,
    quantity: i64,
    tuning: &MarketTuning,
) -> Result<TradeQuote, TradeError> {
    let item = state.market.get(item_id).ok_or(TradeError::ItemNotFound)?;
    if quantity <= 0 {
        return Err(TradeError::InvalidQuantity);
    }
    Ok(TradeQuote {
        item_id: item.id.clone(),
        quantity,
        unit_price: item.current_price,
        total: item.current_price * quantity as f64 * tuning.sell_ratio,
    })
}

/// Queue a settled purchase for the next activity adjustment, which is
/// where its volume moves demand and supply.
pub fn record_purchase(state: &mut SimState, quote: &TradeQuote) {
    if let Some(item) = state.market.get_mut(&quote.item_id) {
        item.pending_purchases += quote.quantity.max(0) as u64;
    }
}

/// Queue a settled sale for the next activity adjustment.
pub fn record_sale(state: &mut SimState, quote: &TradeQuote) {
    if let Some(item) = state.market.get_mut(&quote.item_id) {
        item.pending_sales += quote.quantity.max(0) as u64;
    }
}

/// Periodic price tick.
pub struct MarketSystem {
    interval: Duration,
}

impl MarketSystem {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl SimSystem for MarketSystem {
    fn name(&self) -> &str {
        "market"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let items = update_prices(ctx.state, &ctx.config.market, ctx.rng, ctx.now);
        tracing::debug!(items, "market prices updated");
        ctx.signals.push(Signal::PricesUpdated { items });
    }
}
