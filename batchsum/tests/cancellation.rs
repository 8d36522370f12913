use batchsum::concurrency::barrier::BarrierError;
use batchsum::concurrency::session::Phase;
use batchsum::coordinator::Coordinator;
use batchsum::dispatcher::{WorkDispatcher, WorkerRuntime};
use batchsum::error::CoordinatorError;
use batchsum::types::BatchResult;
use config::shared::{ConcurrentReleasePolicy, WorkersConfig};
use telemetry::init_test_tracing;
use tokio::runtime::Handle;
use tokio::time::sleep;

use crate::common::{
    BLOCKED_GRACE, coordinator, coordinator_with_policy, wait_for_pending, wait_for_session,
    within_timeout,
};

mod common;

async fn wait_for_confirming(coordinator: &Coordinator) {
    wait_for_session(coordinator, |snapshot| snapshot.phase == Phase::Confirming).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn contributor_cancelled_before_release_still_counts() {
    init_test_tracing();
    let coordinator = coordinator();

    let contributor = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.submit(5).await })
    };
    wait_for_pending(&coordinator, 1).await;

    contributor.abort();
    assert!(within_timeout(contributor).await.unwrap_err().is_cancelled());

    let terminated = within_timeout(coordinator.terminate("t")).await.unwrap();
    assert_eq!(terminated, BatchResult::new(5, "t"));

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.phase, Phase::Open);
    assert_eq!(snapshot.pending_count, 0);
    assert_eq!(snapshot.generation, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn contributor_dropped_during_release_does_not_stall_the_terminator() {
    init_test_tracing();
    let coordinator = coordinator();

    let registration = coordinator.barrier().register(3).await;
    let contributor = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.submit(4).await })
    };
    wait_for_pending(&coordinator, 2).await;

    let terminator = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.terminate("t").await })
    };
    wait_for_confirming(&coordinator).await;

    drop(registration);

    let expected = BatchResult::new(7, "t");
    assert_eq!(within_timeout(terminator).await.unwrap().unwrap(), expected);
    assert_eq!(within_timeout(contributor).await.unwrap(), expected);
    assert_eq!(coordinator.snapshot().generation, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn last_contributor_resets_after_the_terminator_is_cancelled() {
    init_test_tracing();
    let coordinator = coordinator();

    let registration = coordinator.barrier().register(2).await;
    let terminator = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.terminate("gone").await })
    };
    wait_for_confirming(&coordinator).await;

    terminator.abort();
    assert!(within_timeout(terminator).await.unwrap_err().is_cancelled());

    let released = within_timeout(registration.wait_for_release()).await;
    assert_eq!(released, BatchResult::new(2, "gone"));

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.phase, Phase::Open);
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.total, 0);

    let terminated = within_timeout(coordinator.terminate("next")).await.unwrap();
    assert_eq!(terminated, BatchResult::new(0, "next"));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_release_is_rejected_with_the_reject_policy() {
    init_test_tracing();
    let coordinator = coordinator_with_policy(ConcurrentReleasePolicy::Reject);

    let registration = coordinator.barrier().register(1).await;
    let terminator = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.terminate("first").await })
    };
    wait_for_confirming(&coordinator).await;

    let err = coordinator.terminate("second").await.unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Barrier(BarrierError::ReleaseInProgress)
    ));
    assert!(err.is_client_error());

    let expected = BatchResult::new(1, "first");
    assert_eq!(
        within_timeout(registration.wait_for_release()).await,
        expected
    );
    assert_eq!(within_timeout(terminator).await.unwrap().unwrap(), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_release_closes_the_next_batch_with_the_queue_policy() {
    init_test_tracing();
    let coordinator = coordinator_with_policy(ConcurrentReleasePolicy::Queue);

    let registration = coordinator.barrier().register(1).await;
    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.terminate("first").await })
    };
    wait_for_confirming(&coordinator).await;

    let second = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.terminate("second").await })
    };
    sleep(BLOCKED_GRACE).await;
    assert!(!second.is_finished());

    let expected = BatchResult::new(1, "first");
    assert_eq!(
        within_timeout(registration.wait_for_release()).await,
        expected
    );
    assert_eq!(within_timeout(first).await.unwrap().unwrap(), expected);
    assert_eq!(
        within_timeout(second).await.unwrap().unwrap(),
        BatchResult::new(0, "second")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn dispatcher_runs_each_operation_on_its_own_task() {
    init_test_tracing();
    let coordinator = coordinator();
    let dispatcher = WorkDispatcher::new(coordinator.clone(), Handle::current());

    let contributor = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch("3".to_string()).await })
    };
    wait_for_pending(&coordinator, 1).await;

    let terminated = within_timeout(dispatcher.dispatch("end d".to_string()))
        .await
        .unwrap();
    assert_eq!(terminated, BatchResult::new(3, "d"));
    assert_eq!(
        within_timeout(contributor).await.unwrap().unwrap(),
        terminated
    );

    let err = dispatcher.dispatch("end-d".to_string()).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidCommand(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn operation_outlives_its_dropped_caller() {
    init_test_tracing();
    let coordinator = coordinator();
    let dispatcher = WorkDispatcher::new(coordinator.clone(), Handle::current());

    let caller = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch("4".to_string()).await })
    };
    wait_for_pending(&coordinator, 1).await;

    caller.abort();
    assert!(within_timeout(caller).await.unwrap_err().is_cancelled());

    // The operation task is still registered and acknowledges the release itself.
    let terminated = within_timeout(dispatcher.dispatch("end gone".to_string()))
        .await
        .unwrap();
    assert_eq!(terminated, BatchResult::new(4, "gone"));

    let snapshot = wait_for_session(&coordinator, |snapshot| snapshot.generation == 1).await;
    assert_eq!(snapshot.pending_count, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_runtime_executes_dispatched_operations() {
    init_test_tracing();
    let workers = WorkerRuntime::new(&WorkersConfig { worker_threads: 2 }).unwrap();
    let coordinator = coordinator();
    let dispatcher = WorkDispatcher::new(coordinator.clone(), workers.handle());

    let contributors: Vec<_> = ["10", "-3", "+1"]
        .into_iter()
        .map(|body| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.dispatch(body.to_string()).await })
        })
        .collect();
    wait_for_pending(&coordinator, 3).await;

    let terminated = within_timeout(dispatcher.dispatch("end w".to_string()))
        .await
        .unwrap();
    assert_eq!(terminated, BatchResult::new(8, "w"));
    for contributor in contributors {
        assert_eq!(
            within_timeout(contributor).await.unwrap().unwrap(),
            terminated
        );
    }

    drop(workers);
}
