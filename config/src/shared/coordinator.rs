use serde::{Deserialize, Serialize};

/// What happens to a terminate call that arrives while another one is still
/// releasing the current batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentReleasePolicy {
    /// Wait for the batch in flight to reset, then close the following batch.
    #[default]
    Queue,

    /// Fail immediately with a conflict.
    Reject,
}

/// Settings of the batch coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoordinatorConfig {
    /// Behaviour of a terminate call racing with a release in progress.
    #[serde(default)]
    pub concurrent_release: ConcurrentReleasePolicy,
}
