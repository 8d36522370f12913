use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings of the runtime that executes one task per inbound operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkersConfig {
    /// Number of threads driving operation tasks.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl WorkersConfig {
    /// Default number of worker threads.
    pub const DEFAULT_WORKER_THREADS: usize = 4;

    /// Validates worker settings.
    ///
    /// Ensures at least one worker thread is configured.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_threads == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "workers.worker_threads".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
        }
    }
}

fn default_worker_threads() -> usize {
    WorkersConfig::DEFAULT_WORKER_THREADS
}
