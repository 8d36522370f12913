//! Rendezvous between the contributors of a batch and its terminator.
//!
//! The session state lives inside a [`watch`] channel. The channel's lock is the
//! single critical section guarding the phase, the pending count, the token and the
//! total, and its change notifications are the wake-up signal: mutations go through
//! [`watch::Sender::send_if_modified`], waits go through
//! [`watch::Receiver::wait_for`], which drops the lock while suspended and
//! re-evaluates its predicate on every change.
//!
//! A release runs in two steps. The terminator first claims the session and wakes
//! every pending contributor, then waits until each of them has read the total
//! before snapshotting and resetting it. Contributors arriving in between wait for
//! the next open session and join the following batch.

use config::shared::{ConcurrentReleasePolicy, CoordinatorConfig};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::concurrency::session::{ReleaseStart, SessionSnapshot, SessionState};
use crate::types::{BatchResult, Generation};

/// Errors returned by [`SessionBarrier::release`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BarrierError {
    /// Another terminator is releasing the current batch and the barrier is
    /// configured with [`ConcurrentReleasePolicy::Reject`].
    #[error("a release is already in progress for the current batch")]
    ReleaseInProgress,
}

/// Cyclic barrier whose party count is fixed when the terminator arrives.
#[derive(Debug)]
pub struct SessionBarrier {
    state: watch::Sender<SessionState>,
    concurrent_release: ConcurrentReleasePolicy,
}

impl SessionBarrier {
    /// Creates a barrier with an empty open session.
    pub fn new(config: &CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(SessionState::new());

        Self {
            state,
            concurrent_release: config.concurrent_release,
        }
    }

    /// Returns a view of the current session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().snapshot()
    }

    /// Adds `delta` to the current batch and waits until the batch is released.
    ///
    /// Returns the batch total and the terminator's token.
    pub async fn register_and_wait(&self, delta: i64) -> BatchResult {
        self.register(delta).await.wait_for_release().await
    }

    /// Adds `delta` to the open session and returns the contributor's registration.
    ///
    /// While a release is in progress this waits for the next open session, so the
    /// contribution is never counted in a batch that is already being released.
    pub async fn register(&self, delta: i64) -> Registration<'_> {
        let mut state_rx = self.state.subscribe();

        loop {
            let mut registered = None;
            self.state.send_if_modified(|state| {
                registered = state.try_register(delta);
                false
            });

            if let Some(generation) = registered {
                debug!(generation, delta, "contributor registered");

                return Registration {
                    barrier: self,
                    generation,
                    acknowledged: false,
                };
            }

            debug!(delta, "release in progress, waiting for the next session");
            wait_until(&mut state_rx, |state| state.is_open()).await;
        }
    }

    /// Closes the current batch with `token`.
    ///
    /// Wakes every contributor registered in the batch, waits until all of them read
    /// the total, then resets the session and returns the same result to the caller.
    /// Without pending contributors this returns a zero sum straight away.
    pub async fn release(&self, token: impl Into<String>) -> Result<BatchResult, BarrierError> {
        let mut token = Some(token.into());
        let mut state_rx = self.state.subscribe();

        let start = loop {
            let mut start = None;
            self.state.send_if_modified(|state| {
                start = state.try_begin_release(&mut token);
                start.is_some()
            });

            if let Some(start) = start {
                break start;
            }

            match self.concurrent_release {
                ConcurrentReleasePolicy::Reject => {
                    warn!("rejected release while another one is in progress");
                    return Err(BarrierError::ReleaseInProgress);
                }
                ConcurrentReleasePolicy::Queue => {
                    debug!("release in progress, queueing for the next session");
                    wait_until(&mut state_rx, |state| state.is_open()).await;
                }
            }
        };

        let (generation, released) = match start {
            ReleaseStart::Completed(result) => {
                info!(sum = result.sum, token = %result.token, released = 0, "batch released");
                return Ok(result);
            }
            ReleaseStart::Waiting {
                generation,
                released,
            } => (generation, released),
        };

        debug!(generation, released, "woke up pending contributors");

        let mut in_flight = ReleaseInFlight {
            barrier: self,
            generation,
            completed: false,
        };

        self.state.send_if_modified(|state| {
            state.begin_confirm(generation);
            false
        });
        wait_until(&mut state_rx, |state| state.is_confirmed(generation)).await;

        let mut result = BatchResult::default();
        self.state.send_if_modified(|state| {
            result = state.complete_release(generation);
            true
        });
        in_flight.completed = true;

        info!(
            generation,
            sum = result.sum,
            token = %result.token,
            released,
            "batch released"
        );

        Ok(result)
    }
}

/// A contributor registered in a session and not yet released.
///
/// Dropping it before [`Registration::wait_for_release`] returns still accounts for
/// the contributor, so a terminator waiting for acknowledgments is never stalled by
/// a caller that went away.
#[derive(Debug)]
#[must_use = "a registration holds up the release until it is awaited or dropped"]
pub struct Registration<'a> {
    barrier: &'a SessionBarrier,
    generation: Generation,
    acknowledged: bool,
}

impl Registration<'_> {
    /// Generation of the session the contributor belongs to.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Waits until the batch is released, then reads and acknowledges its result.
    pub async fn wait_for_release(mut self) -> BatchResult {
        let generation = self.generation;
        let mut state_rx = self.barrier.state.subscribe();

        wait_until(&mut state_rx, |state| state.is_released(generation)).await;

        let mut result = BatchResult::default();
        self.barrier.state.send_if_modified(|state| {
            let (released, notify) = state.acknowledge(generation);
            result = released;
            notify
        });
        self.acknowledged = true;

        debug!(generation, sum = result.sum, "contributor released");

        result
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.acknowledged {
            return;
        }

        let generation = self.generation;
        self.barrier
            .state
            .send_if_modified(|state| state.abandon(generation));

        warn!(generation, "contributor went away before reading its batch result");
    }
}

/// Terminator holding a session between wake-up and reset.
struct ReleaseInFlight<'a> {
    barrier: &'a SessionBarrier,
    generation: Generation,
    completed: bool,
}

impl Drop for ReleaseInFlight<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let generation = self.generation;
        self.barrier
            .state
            .send_if_modified(|state| state.detach_terminator(generation));

        warn!(
            generation,
            "terminator went away during release, the last contributor will reset the session"
        );
    }
}

/// Suspends until `predicate` holds for the session state.
async fn wait_until(
    state_rx: &mut watch::Receiver<SessionState>,
    predicate: impl FnMut(&SessionState) -> bool,
) {
    // The barrier owns the sender and outlives every receiver it hands out.
    state_rx
        .wait_for(predicate)
        .await
        .expect("session state sender dropped while a participant was waiting");
}
