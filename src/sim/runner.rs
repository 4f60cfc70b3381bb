use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use super::context::TickContext;
use super::economy::EconomicIndexSystem;
use super::events::EventExpirySystem;
use super::market::MarketSystem;
use super::signal::{Signal, SignalBus};
use super::system::SimSystem;
use crate::clock::Clock;
use crate::config::SimConfig;
use crate::db::Cache;
use crate::db::snapshot::{WorldSnapshot, save_snapshot};
use crate::flush::flush_to_jsonl;
use crate::model::{SharedState, SimState};

/// Returns true once `interval` has elapsed since `last_fired`.
pub fn should_fire(last_fired: Instant, now: Instant, interval: Duration) -> bool {
    now.saturating_duration_since(last_fired) >= interval
}

struct Scheduled {
    system: Box<dyn SimSystem>,
    last_fired: Instant,
}

/// Owns the registered systems and when each last ran.
pub struct Scheduler {
    systems: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// The expiry sweep, price tick and index recompute at their configured
    /// intervals, measured from `start`.
    pub fn with_default_systems(config: &SimConfig, start: Instant) -> Self {
        let mut scheduler = Self::new();
        scheduler.register(Box::new(EventExpirySystem::new(config.event_sweep_interval())), start);
        scheduler.register(Box::new(MarketSystem::new(config.price_update_interval())), start);
        scheduler.register(
            Box::new(EconomicIndexSystem::new(config.economic_recompute_interval())),
            start,
        );
        scheduler
    }

    /// Register a system. It first fires one interval after `start`.
    pub fn register(&mut self, system: Box<dyn SimSystem>, start: Instant) {
        self.systems.push(Scheduled {
            system,
            last_fired: start,
        });
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Run every due system once, in registration order, and return the
    /// signals they emitted.
    pub fn dispatch_due(
        &mut self,
        state: &mut SimState,
        config: &SimConfig,
        rng: &mut dyn RngCore,
        now: Instant,
        wall_now: chrono::DateTime<chrono::Utc>,
    ) -> Vec<Signal> {
        let mut signals = Vec::new();
        for scheduled in self.systems.iter_mut() {
            if !should_fire(scheduled.last_fired, now, scheduled.system.interval()) {
                continue;
            }
            let mut ctx = TickContext {
                state: &mut *state,
                config,
                rng: &mut *rng,
                now: wall_now,
                signals: &mut signals,
            };
            scheduled.system.tick(&mut ctx);
            scheduled.last_fired = now;
        }
        signals
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the background tick loop needs, moved into its task.
pub struct SchedulerTask {
    pub state: SharedState,
    pub scheduler: Scheduler,
    pub config: Arc<SimConfig>,
    pub clock: Arc<dyn Clock>,
    pub bus: SignalBus,
    pub cache: Arc<dyn Cache>,
}

impl SchedulerTask {
    /// Tick until `shutdown` flips to true or its sender is dropped.
    ///
    /// The state lock is held only while systems run; signals are published
    /// and checkpoints written after it is released.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let mut ticker = tokio::time::interval(self.config.base_tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(systems = ?self.scheduler.system_names(), "scheduler started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                now = ticker.tick() => {
                    self.tick(now, &mut rng).await;
                }
            }
        }

        tracing::info!("scheduler stopped");
    }

    async fn tick(&mut self, now: Instant, rng: &mut SmallRng) {
        let (signals, snapshot) = {
            let mut state = self.state.lock();
            let signals =
                self.scheduler
                    .dispatch_due(&mut state, &self.config, rng, now, self.clock.now());
            let snapshot = (!signals.is_empty() && self.config.checkpoint_on_tick)
                .then(|| WorldSnapshot::capture(&state));
            (signals, snapshot)
        };

        self.bus.emit_all(signals);

        if let Some(snapshot) = snapshot {
            if let Err(err) =
                save_snapshot(self.cache.as_ref(), &snapshot, self.config.cache_ttl_secs).await
            {
                tracing::warn!(error = %err, "state checkpoint failed; continuing in memory");
            }
            if let Some(dir) = &self.config.flush_dir {
                if let Err(err) = flush_to_jsonl(&snapshot, dir) {
                    tracing::warn!(error = %err, dir = %dir.display(), "jsonl flush failed");
                }
            }
        }
    }
}
