use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{ApplicationSettings, CoordinatorConfig, ValidationError, WorkersConfig};

/// Complete configuration of the sum service.
///
/// Loaded once at startup with [`crate::load_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listener settings.
    pub application: ApplicationSettings,
    /// Runtime executing the operations.
    #[serde(default)]
    pub workers: WorkersConfig,
    /// Batch coordinator settings.
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

impl ServerConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.application.validate()?;
        self.workers.validate()
    }
}

impl Config for ServerConfig {}
