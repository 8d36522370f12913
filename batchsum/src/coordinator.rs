use config::shared::CoordinatorConfig;
use tracing::debug;

use crate::command::Command;
use crate::concurrency::barrier::SessionBarrier;
use crate::concurrency::session::SessionSnapshot;
use crate::error::CoordinatorResult;
use crate::types::BatchResult;

/// Entry points used by the workers executing inbound operations.
///
/// A single coordinator is created at startup and shared by reference with every
/// worker. Each call may suspend for as long as its batch stays open, so every
/// call must run on its own task.
#[derive(Debug)]
pub struct Coordinator {
    barrier: SessionBarrier,
}

impl Coordinator {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            barrier: SessionBarrier::new(config),
        }
    }

    /// Contributes `value` to the current batch and waits for the batch result.
    pub async fn submit(&self, value: i64) -> BatchResult {
        self.barrier.register_and_wait(value).await
    }

    /// Closes the current batch and returns its result.
    pub async fn terminate(&self, token: impl Into<String>) -> CoordinatorResult<BatchResult> {
        Ok(self.barrier.release(token).await?)
    }

    /// Parses a request body and runs the operation it describes.
    ///
    /// Malformed bodies fail before the barrier is touched.
    pub async fn handle(&self, body: &str) -> CoordinatorResult<BatchResult> {
        let command = body.parse::<Command>()?;
        debug!(?command, "handling operation");

        match command {
            Command::Contribute(value) => Ok(self.submit(value).await),
            Command::Terminate { token } => self.terminate(token).await,
        }
    }

    /// Returns a view of the current session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.barrier.snapshot()
    }

    /// Returns the barrier backing this coordinator.
    pub fn barrier(&self) -> &SessionBarrier {
        &self.barrier
    }
}
