//! Tracing setup shared by the sum service binaries and tests.
//!
//! In [`Environment::Dev`] logs are written pretty-printed to stdout. In
//! [`Environment::Prod`] they are written as JSON to a daily rotated file through a
//! non-blocking writer, whose buffered lines are flushed when the returned
//! [`LogFlusher`] is dropped.

use std::sync::Once;

use config::Environment;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Directory where production log files are written.
const LOGS_DIRECTORY: &str = "logs";

/// Filter applied when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable enabling log output in tests.
const ENABLE_TEST_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] std::io::Error),

    #[error("failed to install the log bridge: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to set the global tracing subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("failed to create the log file appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
}

/// Keeps the non-blocking log writer alive.
///
/// Dropping it flushes any buffered lines, so it must be held until the end of `main`.
#[must_use = "dropping the flusher stops file logging"]
pub struct LogFlusher {
    _guard: Option<WorkerGuard>,
}

/// Installs the global tracing subscriber for the binary `app_name`.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match Environment::load()? {
        Environment::Prod => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(app_name)
                .filename_suffix("log")
                .build(LOGS_DIRECTORY)?;
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            let subscriber = Registry::default().with(filter).with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(writer),
            );
            tracing::subscriber::set_global_default(subscriber)?;

            Ok(LogFlusher {
                _guard: Some(guard),
            })
        }
        Environment::Dev => {
            let subscriber = Registry::default()
                .with(filter)
                .with(fmt::layer().pretty().with_target(true));
            tracing::subscriber::set_global_default(subscriber)?;

            Ok(LogFlusher { _guard: None })
        }
    }
}

/// Installs a test subscriber once per process when `ENABLE_TRACING` is set.
///
/// Safe to call from every test; subsequent calls are no-ops.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        if std::env::var(ENABLE_TEST_TRACING_ENV_NAME).is_err() {
            return;
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_test_writer());

        // Another harness may already own the global default.
        tracing::subscriber::set_global_default(subscriber).ok();
    });
}
