use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, web};
use batchsum::coordinator::Coordinator;
use batchsum::dispatcher::{WorkDispatcher, WorkerRuntime};
use config::shared::{ApplicationSettings, ServerConfig};
use tracing::info;

use crate::request_logging::RequestLogging;
use crate::routes::{health_check::health_check, operations::submit_operation};

/// Sum service application server wrapper.
///
/// Owns the worker runtime executing the operations, which is shut down once the
/// server stops.
pub struct Application {
    port: u16,
    server: Server,
    _workers: WorkerRuntime,
}

impl Application {
    /// Binds the listener, starts the worker runtime and builds the HTTP server
    /// around a fresh [`Coordinator`].
    pub fn build(config: ServerConfig) -> anyhow::Result<Self> {
        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let workers = WorkerRuntime::new(&config.workers)?;
        let coordinator = Arc::new(Coordinator::new(&config.coordinator));
        let dispatcher = WorkDispatcher::new(coordinator, workers.handle());

        let server = run(&config.application, listener, dispatcher)?;

        info!(
            host = %config.application.host,
            port,
            worker_threads = config.workers.worker_threads,
            concurrent_release = ?config.coordinator.concurrent_release,
            "sum service started"
        );

        Ok(Self {
            port,
            server,
            _workers: workers,
        })
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Runs the server until it receives a shutdown signal.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Creates the HTTP server serving operations through `dispatcher`.
pub fn run(
    settings: &ApplicationSettings,
    listener: TcpListener,
    dispatcher: WorkDispatcher,
) -> Result<Server, std::io::Error> {
    let dispatcher = web::Data::new(dispatcher);
    let payload_config = web::PayloadConfig::new(settings.max_body_bytes);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            .app_data(payload_config.clone())
            .app_data(dispatcher.clone())
            .service(health_check)
            .service(submit_operation)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
