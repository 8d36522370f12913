use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationSettings {
    /// Host the server binds to.
    pub host: String,
    /// Port the server binds to, `0` picks an ephemeral port.
    pub port: u16,
    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ApplicationSettings {
    /// Default body limit. Operations are a number or a short command.
    pub const DEFAULT_MAX_BODY_BYTES: usize = 4096;

    /// Validates listener settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "application.host".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }

        if self.max_body_bytes == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "application.max_body_bytes".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn default_max_body_bytes() -> usize {
    ApplicationSettings::DEFAULT_MAX_BODY_BYTES
}
