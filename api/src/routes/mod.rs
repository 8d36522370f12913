use serde::{Deserialize, Serialize};

pub mod health_check;
pub mod operations;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}
