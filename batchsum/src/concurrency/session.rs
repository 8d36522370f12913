//! State machine of the current batch.
//!
//! Every method here runs inside the barrier's critical section and never waits.
//! Methods that take a [`Generation`] panic if it does not match the current
//! session: a registration or a release can only outlive its session through a bug
//! in the barrier, and carrying on would hand out sums from the wrong batch.

use std::fmt;

use crate::accumulator::Accumulator;
use crate::correlation::CorrelationRegister;
use crate::types::{BatchResult, Generation};

/// Phase of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Contributors may register.
    Open,
    /// A terminator captured the pending contributors and woke them up.
    Releasing,
    /// The terminator waits for every released contributor to acknowledge.
    Confirming,
    /// The total is being snapshotted and cleared. Never observed outside of
    /// the critical section.
    Resetting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Open => "open",
            Phase::Releasing => "releasing",
            Phase::Confirming => "confirming",
            Phase::Resetting => "resetting",
        };

        f.write_str(name)
    }
}

/// Read-only view of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub generation: Generation,
    pub phase: Phase,
    /// Contributors registered and not yet acknowledged.
    pub pending_count: usize,
    /// Running total of the session.
    pub total: i64,
}

/// Outcome of a terminator claiming the current session.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReleaseStart {
    /// Nobody had to be woken up, the session already reset.
    Completed(BatchResult),
    /// `released` contributors must acknowledge before the session can reset.
    Waiting {
        generation: Generation,
        released: usize,
    },
}

#[derive(Debug)]
pub(crate) struct SessionState {
    generation: Generation,
    phase: Phase,
    pending_count: usize,
    // Registrations dropped while the session was still open. They stay in
    // `pending_count` until a release acknowledges them on their behalf.
    abandoned_count: usize,
    terminator_attached: bool,
    accumulator: Accumulator,
    token: CorrelationRegister,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            phase: Phase::Open,
            pending_count: 0,
            abandoned_count: 0,
            terminator_attached: false,
            accumulator: Accumulator::new(),
            token: CorrelationRegister::new(),
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            generation: self.generation,
            phase: self.phase,
            pending_count: self.pending_count,
            total: self.accumulator.current(),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }

    /// Whether a contributor registered in `generation` may read its result.
    pub(crate) fn is_released(&self, generation: Generation) -> bool {
        self.generation != generation || self.phase != Phase::Open
    }

    /// Whether the terminator of `generation` may reset the session.
    pub(crate) fn is_confirmed(&self, generation: Generation) -> bool {
        self.generation != generation || self.pending_count == 0
    }

    /// Adds a contributor to the open session.
    ///
    /// Returns `None` while a release is in progress; the caller has to wait for the
    /// next open session.
    pub(crate) fn try_register(&mut self, delta: i64) -> Option<Generation> {
        if !self.is_open() {
            return None;
        }

        self.accumulator.accumulate(delta);
        self.pending_count += 1;

        Some(self.generation)
    }

    /// Claims the open session for a terminator carrying `token`.
    ///
    /// Returns `None` while another release is in progress. When no contributor has
    /// to acknowledge, the session resets right away.
    pub(crate) fn try_begin_release(&mut self, token: &mut Option<String>) -> Option<ReleaseStart> {
        if !self.is_open() {
            return None;
        }

        self.phase = Phase::Releasing;
        self.token.store(token.take().unwrap_or_default());
        self.terminator_attached = true;

        // Abandoned contributors will never come back to acknowledge.
        self.pending_count = self
            .pending_count
            .checked_sub(self.abandoned_count)
            .expect("more abandoned registrations than pending contributors");
        self.abandoned_count = 0;

        if self.pending_count == 0 {
            return Some(ReleaseStart::Completed(self.reset()));
        }

        Some(ReleaseStart::Waiting {
            generation: self.generation,
            released: self.pending_count,
        })
    }

    /// Moves a release of `generation` to the confirmation step.
    pub(crate) fn begin_confirm(&mut self, generation: Generation) {
        self.assert_generation(generation);
        if self.phase == Phase::Releasing {
            self.phase = Phase::Confirming;
        }
    }

    /// Reads the batch result for a released contributor and acknowledges it.
    ///
    /// The returned flag tells whether waiters must be notified, which is the case
    /// for the last acknowledgment.
    pub(crate) fn acknowledge(&mut self, generation: Generation) -> (BatchResult, bool) {
        self.assert_generation(generation);
        assert!(
            matches!(self.phase, Phase::Releasing | Phase::Confirming),
            "contributor acknowledged a session in phase {}",
            self.phase
        );

        let result = BatchResult::new(self.accumulator.current(), self.token.get());
        let notify = self.acknowledge_release();

        (result, notify)
    }

    /// Accounts for a registration of `generation` that went away without reading its
    /// result. Returns whether waiters must be notified.
    pub(crate) fn abandon(&mut self, generation: Generation) -> bool {
        self.assert_generation(generation);

        match self.phase {
            Phase::Open => {
                self.abandoned_count += 1;
                false
            }
            Phase::Releasing | Phase::Confirming => self.acknowledge_release(),
            Phase::Resetting => unreachable!("resetting is never observed outside a transition"),
        }
    }

    /// Resets the session once every released contributor acknowledged and returns
    /// the batch result for the terminator.
    pub(crate) fn complete_release(&mut self, generation: Generation) -> BatchResult {
        self.assert_generation(generation);
        assert!(
            self.terminator_attached,
            "release completed by a detached terminator"
        );

        self.reset()
    }

    /// Detaches a terminator of `generation` that went away before completing.
    ///
    /// If acknowledgments are still outstanding, the last one resets the session.
    /// Returns whether waiters must be notified.
    pub(crate) fn detach_terminator(&mut self, generation: Generation) -> bool {
        self.assert_generation(generation);

        if self.pending_count == 0 {
            self.reset();
            return true;
        }

        self.terminator_attached = false;
        false
    }

    fn acknowledge_release(&mut self) -> bool {
        self.pending_count = self
            .pending_count
            .checked_sub(1)
            .expect("more acknowledgments than released contributors");

        if self.pending_count > 0 {
            return false;
        }

        if !self.terminator_attached {
            self.reset();
        }

        true
    }

    fn reset(&mut self) -> BatchResult {
        self.phase = Phase::Resetting;
        assert_eq!(
            self.pending_count, 0,
            "session reset with contributors still pending"
        );
        assert_eq!(
            self.abandoned_count, 0,
            "session reset with abandoned registrations"
        );

        let result = BatchResult {
            sum: self.accumulator.snapshot_and_reset(),
            token: self.token.take(),
        };

        self.generation = self.generation.wrapping_add(1);
        self.terminator_attached = false;
        self.phase = Phase::Open;

        result
    }

    fn assert_generation(&self, generation: Generation) {
        assert_eq!(
            self.generation, generation,
            "session generation moved on while a participant was still attached"
        );
    }
}
