use std::time::Duration;

use chrono::{DateTime, Utc};

use super::context::TickContext;
use super::signal::Signal;
use super::system::SimSystem;
use crate::config::EconomicThresholds;
use crate::model::economy::clamp_index;
use crate::model::{
    CrimeLevel, EconomicEvent, EconomicLevel, EconomicPatch, EconomicState, ItemCategory, SimState,
};

/// Inflation reported when there is no economic history to go on.
pub const DEFAULT_INFLATION: f64 = 0.02;

fn changed_signal(state: &EconomicState) -> Signal {
    Signal::EconomicStateChanged {
        law_enforcement_activity: state.law_enforcement_activity,
        business_activity: state.business_activity,
    }
}

/// Merge `patch` into the economic state. Returns `false` (and does nothing)
/// when the state has not been seeded yet.
pub fn update_economic_state(
    state: &mut SimState,
    patch: EconomicPatch,
    now: DateTime<Utc>,
    signals: &mut Vec<Signal>,
) -> bool {
    let Some(econ) = state.economic.as_mut() else {
        tracing::debug!("economic patch ignored: no economic state");
        return false;
    };
    patch.apply_to(econ);
    econ.last_update = now;
    signals.push(changed_signal(econ));
    true
}

pub fn economic_level(state: &EconomicState, thresholds: &EconomicThresholds) -> EconomicLevel {
    let activity = state.business_activity;
    if activity >= thresholds.wealthy_at {
        EconomicLevel::Wealthy
    } else if activity < thresholds.poor_below {
        EconomicLevel::Poor
    } else {
        EconomicLevel::Average
    }
}

/// Crime runs opposite to policing: heavy law enforcement means low crime.
pub fn crime_level(state: &EconomicState, thresholds: &EconomicThresholds) -> CrimeLevel {
    let policing = state.law_enforcement_activity;
    if policing >= thresholds.low_crime_at {
        CrimeLevel::Low
    } else if policing < thresholds.high_crime_below {
        CrimeLevel::High
    } else {
        CrimeLevel::Medium
    }
}

/// Net inflation from recent shocks: the sum of their signed impacts.
pub fn calculate_inflation(events: &[EconomicEvent]) -> f64 {
    if events.is_empty() {
        return DEFAULT_INFLATION;
    }
    events.iter().map(|e| e.impact).sum()
}

/// Rebuild the market-derived indices from current item data.
///
/// Drug prices mirror the current price of each drug item; weapon
/// availability is the mean supply across weapons and ammunition. Returns
/// `false` if there is no economic state to update.
pub fn recompute_indices(state: &mut SimState, now: DateTime<Utc>, signals: &mut Vec<Signal>) -> bool {
    let Some(econ) = state.economic.as_mut() else {
        return false;
    };

    for item in state.market.values() {
        if item.category == ItemCategory::Drug {
            econ.drug_prices.insert(item.id.clone(), item.current_price);
        }
    }

    let armed: Vec<f64> = state
        .market
        .values()
        .filter(|i| matches!(i.category, ItemCategory::Weapon | ItemCategory::Ammunition))
        .map(|i| i.supply)
        .collect();
    if !armed.is_empty() {
        econ.weapon_availability = clamp_index(armed.iter().sum::<f64>() / armed.len() as f64);
    }

    econ.clamp_indices();
    econ.last_update = now;
    signals.push(changed_signal(econ));
    true
}

/// Periodic recompute of the market-derived economic indices.
pub struct EconomicIndexSystem {
    interval: Duration,
}

impl EconomicIndexSystem {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl SimSystem for EconomicIndexSystem {
    fn name(&self) -> &str {
        "economic_index"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        recompute_indices(ctx.state, ctx.now, ctx.signals);
    }
}
