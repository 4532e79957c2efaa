//! Row ID allocation.

use crate::backend::IdAllocator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Low bits reserved below the millisecond timestamp of a clock seed.
const SEQUENCE_BITS: u32 = 22;

/// A monotonic ID generator.
///
/// IDs are strictly increasing for the lifetime of the generator. A clock
/// seeded generator starts at `millis << 22`, so generators created later do
/// not collide with IDs handed out by earlier runs at the same rate.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Creates a generator whose first ID is `seed` (or 1 for a zero seed).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed.max(1)),
        }
    }

    /// Creates a generator seeded from the wall clock.
    #[must_use]
    pub fn from_clock() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::with_seed(millis << SEQUENCE_BITS)
    }

    /// Makes sure every future ID is greater than `id`.
    pub fn observe(&self, id: u64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    /// Returns the ID the next call to [`IdAllocator::next_id`] hands out.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_clock()
    }
}

impl IdAllocator for IdGenerator {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
