#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use batchsum::concurrency::session::{Phase, SessionSnapshot};
use batchsum::coordinator::Coordinator;
use config::shared::{ConcurrentReleasePolicy, CoordinatorConfig};
use tokio::time::{sleep, timeout};

/// Upper bound for any operation that is expected to complete.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait before concluding that an operation is still blocked.
pub const BLOCKED_GRACE: Duration = Duration::from_millis(100);

pub fn coordinator() -> Arc<Coordinator> {
    coordinator_with_policy(ConcurrentReleasePolicy::Queue)
}

pub fn coordinator_with_policy(concurrent_release: ConcurrentReleasePolicy) -> Arc<Coordinator> {
    Arc::new(Coordinator::new(&CoordinatorConfig { concurrent_release }))
}

/// Awaits `future`, panicking if it does not complete within [`TEST_TIMEOUT`].
pub async fn within_timeout<F: Future>(future: F) -> F::Output {
    timeout(TEST_TIMEOUT, future)
        .await
        .expect("operation did not complete before the timeout")
}

/// Polls the coordinator until its session satisfies `predicate`.
pub async fn wait_for_session<P>(coordinator: &Coordinator, predicate: P) -> SessionSnapshot
where
    P: Fn(&SessionSnapshot) -> bool,
{
    within_timeout(async {
        loop {
            let snapshot = coordinator.snapshot();
            if predicate(&snapshot) {
                return snapshot;
            }

            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

/// Waits until `count` contributors are registered in the open session.
pub async fn wait_for_pending(coordinator: &Coordinator, count: usize) -> SessionSnapshot {
    wait_for_session(coordinator, |snapshot| {
        snapshot.phase == Phase::Open && snapshot.pending_count == count
    })
    .await
}
