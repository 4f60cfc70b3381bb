use chrono::{DateTime, Utc};
use rand::RngCore;

use super::signal::Signal;
use crate::config::SimConfig;
use crate::model::SimState;

/// Context passed to each system on every tick.
pub struct TickContext<'a> {
    pub state: &'a mut SimState,
    pub config: &'a SimConfig,
    pub rng: &'a mut dyn RngCore,
    /// Wall-clock time of this tick.
    pub now: DateTime<Utc>,
    /// Systems push signals here; the scheduler publishes them after the
    /// tick, once the state lock is released.
    pub signals: &'a mut Vec<Signal>,
}
