use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for a running simulation.
///
/// Every field has a default, so a JSON document only needs the keys it
/// overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for the market noise and simulated activity.
    pub seed: u64,
    /// Base scheduler resolution. Systems fire on the first base tick at or
    /// after their own interval elapses.
    pub base_tick_secs: u64,
    /// Expired-event sweep interval.
    pub event_sweep_secs: u64,
    /// Market price tick interval.
    pub price_update_secs: u64,
    /// Economic index recompute interval.
    pub economic_recompute_secs: u64,
    /// TTL for state checkpoints written to the cache.
    pub cache_ttl_secs: u64,
    /// Write a cache checkpoint after every scheduler tick that emitted signals.
    pub checkpoint_on_tick: bool,
    /// If set, dump state as JSONL into this directory after each checkpoint.
    pub flush_dir: Option<PathBuf>,
    pub thresholds: EconomicThresholds,
    pub market: MarketTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            base_tick_secs: 1,
            event_sweep_secs: 60,
            price_update_secs: 300,
            economic_recompute_secs: 600,
            cache_ttl_secs: 3600,
            checkpoint_on_tick: true,
            flush_dir: None,
            thresholds: EconomicThresholds::default(),
            market: MarketTuning::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn base_tick(&self) -> Duration {
        Duration::from_secs(self.base_tick_secs.max(1))
    }

    pub fn event_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.event_sweep_secs)
    }

    pub fn price_update_interval(&self) -> Duration {
        Duration::from_secs(self.price_update_secs)
    }

    pub fn economic_recompute_interval(&self) -> Duration {
        Duration::from_secs(self.economic_recompute_secs)
    }
}

/// Split points for the qualitative economy and crime classifications.
///
/// Only the extremes (20 and 80) are pinned by observed behaviour; the
/// middle boundaries are tunable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomicThresholds {
    /// `business_activity` below this is "poor".
    pub poor_below: f64,
    /// `business_activity` at or above this is "wealthy".
    pub wealthy_at: f64,
    /// `law_enforcement_activity` below this means high crime.
    pub high_crime_below: f64,
    /// `law_enforcement_activity` at or above this means low crime.
    pub low_crime_at: f64,
}

impl Default for EconomicThresholds {
    fn default() -> Self {
        Self {
            poor_below: 40.0,
            wealthy_at: 70.0,
            high_crime_below: 40.0,
            low_crime_at: 70.0,
        }
    }
}

/// Knobs of the market pricing engine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarketTuning {
    /// Weight of the supply/demand imbalance in the market force.
    pub imbalance_weight: f64,
    /// Weight of the volatility-scaled noise in the market force.
    pub noise_weight: f64,
    /// Price floor as a fraction of base price.
    pub min_price_ratio: f64,
    /// Price ceiling as a multiple of base price.
    pub max_price_ratio: f64,
    /// Upper bound of the random purchase/restock count per tick.
    pub max_simulated_activity: u32,
    /// Demand change per purchased unit (trades and simulated activity).
    pub demand_per_unit: f64,
    /// Supply change per purchased or restocked unit.
    pub supply_per_unit: f64,
    /// Fraction of the distance to 50 that supply and demand drift back each tick.
    pub mean_reversion: f64,
    /// Fraction of the current price a seller receives.
    pub sell_ratio: f64,
}

impl Default for MarketTuning {
    fn default() -> Self {
        Self {
            imbalance_weight: 0.6,
            noise_weight: 0.4,
            min_price_ratio: 0.5,
            max_price_ratio: 3.0,
            max_simulated_activity: 3,
            demand_per_unit: 1.0,
            supply_per_unit: 1.0,
            mean_reversion: 0.05,
            sell_ratio: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            SimConfig::from_json_str(r#"{"seed": 7, "thresholds": {"wealthy_at": 75.0}}"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.event_sweep_secs, 60);
        assert_eq!(config.thresholds.wealthy_at, 75.0);
        assert_eq!(config.thresholds.poor_below, 40.0);
        assert_eq!(config.market.sell_ratio, 0.9);
    }

    #[test]
    fn base_tick_is_never_zero() {
        let config = SimConfig {
            base_tick_secs: 0,
            ..SimConfig::default()
        };
        assert_eq!(config.base_tick(), Duration::from_secs(1));
    }
}
