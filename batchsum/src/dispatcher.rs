//! Hands every inbound operation to its own task.
//!
//! Operations block until their batch is released, so they must never share a
//! single execution context. The [`WorkDispatcher`] spawns each of them on a
//! multi-threaded runtime and awaits the result. The spawned task keeps running when
//! the caller stops waiting, which lets a contributor whose request was dropped
//! still acknowledge its batch.

use std::io;
use std::panic;
use std::sync::Arc;

use config::shared::WorkersConfig;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{Instrument, info_span};

use crate::coordinator::Coordinator;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::types::BatchResult;

/// Name given to the threads of the [`WorkerRuntime`].
const WORKER_THREAD_NAME: &str = "batchsum-worker";

/// Multi-threaded runtime that executes operations.
///
/// Dropping it shuts the runtime down in the background, which is allowed from
/// within another runtime.
#[derive(Debug)]
pub struct WorkerRuntime {
    runtime: Option<Runtime>,
}

impl WorkerRuntime {
    /// Builds the runtime with the configured number of threads.
    pub fn new(config: &WorkersConfig) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()?;

        Ok(Self {
            runtime: Some(runtime),
        })
    }

    /// Returns a handle to spawn operations on.
    pub fn handle(&self) -> Handle {
        match &self.runtime {
            Some(runtime) => runtime.handle().clone(),
            None => unreachable!("the runtime is only taken on drop"),
        }
    }
}

impl Drop for WorkerRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Dispatches request bodies to the [`Coordinator`], one task per operation.
#[derive(Debug, Clone)]
pub struct WorkDispatcher {
    coordinator: Arc<Coordinator>,
    runtime: Handle,
}

impl WorkDispatcher {
    pub fn new(coordinator: Arc<Coordinator>, runtime: Handle) -> Self {
        Self {
            coordinator,
            runtime,
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Runs the operation described by `body` on its own task and waits for it.
    ///
    /// A panic inside the operation is resumed on the caller, since it means the
    /// barrier's invariants were broken.
    pub async fn dispatch(&self, body: String) -> CoordinatorResult<BatchResult> {
        let coordinator = self.coordinator.clone();
        let span = info_span!("operation", body_len = body.len());

        let worker = self
            .runtime
            .spawn(async move { coordinator.handle(&body).await }.instrument(span));

        match worker.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(_) => Err(CoordinatorError::WorkerCancelled),
        }
    }
}
