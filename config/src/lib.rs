//! Configuration loading for the sum service.
//!
//! Configuration is layered: a `base` file, an environment specific file selected by
//! `APP_ENVIRONMENT`, then `APP_` prefixed environment variables.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
