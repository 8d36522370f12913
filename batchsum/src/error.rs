//! Errors returned by the dispatcher-facing entry points.

use thiserror::Error;

use crate::command::ParseCommandError;
use crate::concurrency::barrier::BarrierError;

/// Convenient result type for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors a caller of the coordinator can recover from.
///
/// None of them leaves the barrier in a different state than before the call.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    InvalidCommand(#[from] ParseCommandError),

    #[error(transparent)]
    Barrier(#[from] BarrierError),

    #[error("the worker running the operation was cancelled")]
    WorkerCancelled,
}

impl CoordinatorError {
    /// Returns `true` when the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoordinatorError::InvalidCommand(_) | CoordinatorError::Barrier(_)
        )
    }
}
