use anyhow::Context;
use api::startup::Application;
use config::load_config;
use config::shared::ServerConfig;
use telemetry::init_tracing;
use tracing::info;

/// Entry point for the sum service.
///
/// Initializes tracing, loads and validates the configuration, then serves requests
/// until the process is stopped.
fn main() -> anyhow::Result<()> {
    // Initialize tracing from the binary name
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    actix_web::rt::System::new().block_on(async_main())?;

    Ok(())
}

async fn async_main() -> anyhow::Result<()> {
    let config =
        load_config::<ServerConfig>().context("loading configuration for server startup")?;
    config
        .validate()
        .context("validating configuration for server startup")?;

    let application = Application::build(config)?;
    info!(port = application.port(), "listening for operations");
    application.run_until_stopped().await?;

    Ok(())
}
