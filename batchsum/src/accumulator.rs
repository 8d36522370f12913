use std::sync::atomic::{AtomicI64, Ordering};

/// Running total of the contributions accepted into the current batch.
///
/// Additions wrap around on overflow, following two's complement `i64` arithmetic,
/// so `i64::MAX + 1` becomes `i64::MIN`. A batch sum is therefore the exact sum of
/// its contributions modulo 2^64.
///
/// The accumulator is safe to share between threads on its own, but the
/// [`SessionBarrier`](crate::concurrency::barrier::SessionBarrier) only touches it
/// inside its critical section so that the total moves together with the session
/// phase.
#[derive(Debug, Default)]
pub struct Accumulator {
    total: AtomicI64,
}

impl Accumulator {
    /// Creates an accumulator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to the total.
    pub fn accumulate(&self, delta: i64) {
        // `fetch_add` on atomics wraps on overflow.
        self.total.fetch_add(delta, Ordering::AcqRel);
    }

    /// Returns the current total without resetting it.
    pub fn current(&self) -> i64 {
        self.total.load(Ordering::Acquire)
    }

    /// Returns the current total and sets it back to zero in a single step.
    pub fn snapshot_and_reset(&self) -> i64 {
        self.total.swap(0, Ordering::AcqRel)
    }
}
