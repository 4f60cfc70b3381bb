use std::time::Duration;

use super::context::TickContext;

/// A periodic unit of simulation work.
///
/// Object-safe so the scheduler can hold `Box<dyn SimSystem>`.
pub trait SimSystem: Send {
    fn name(&self) -> &str;

    /// How long to wait between firings. A zero interval fires every base tick.
    fn interval(&self) -> Duration;

    fn tick(&mut self, ctx: &mut TickContext);
}
