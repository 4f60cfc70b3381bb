/// Monotonic ID generator for world events and market transactions.
///
/// Territories and market items are keyed by stable string slugs chosen at
/// seed time; only runtime-created records draw from this generator.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume after hydration so fresh ids never collide with restored ones.
    pub fn starting_from(start: u64) -> Self {
        Self { next: start.max(1) }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Make sure `id` is never handed out again.
    pub fn advance_past(&mut self, id: u64) {
        self.next = self.next.max(id.saturating_add(1));
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
