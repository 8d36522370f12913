#![allow(dead_code)]

use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use api::startup::run;
use batchsum::concurrency::session::{Phase, SessionSnapshot};
use batchsum::coordinator::Coordinator;
use batchsum::dispatcher::WorkDispatcher;
use config::shared::{ApplicationSettings, ConcurrentReleasePolicy, CoordinatorConfig};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Upper bound for any request that is expected to complete.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub coordinator: Arc<Coordinator>,
    server_handle: JoinHandle<io::Result<()>>,
}

impl TestApp {
    pub async fn post_operation(&self, body: impl Into<String>) -> reqwest::Response {
        let request = self
            .api_client
            .post(format!("{}/", &self.address))
            .body(body.into())
            .send();

        timeout(TEST_TIMEOUT, request)
            .await
            .expect("request did not complete before the timeout")
            .expect("Failed to execute request.")
    }

    /// Posts `body` and returns the status and the text of the response.
    pub async fn submit(&self, body: impl Into<String>) -> (reqwest::StatusCode, String) {
        let response = self.post_operation(body).await;
        let status = response.status();
        let text = response.text().await.expect("failed to read response body");

        (status, text)
    }

    /// Posts `body` from a separate task, for operations that wait on their batch.
    pub fn spawn_operation(
        &self,
        body: impl Into<String>,
    ) -> JoinHandle<(reqwest::StatusCode, String)> {
        let client = self.api_client.clone();
        let url = format!("{}/", &self.address);
        let body = body.into();

        tokio::spawn(async move {
            let response = client
                .post(url)
                .body(body)
                .send()
                .await
                .expect("Failed to execute request.");
            let status = response.status();
            let text = response.text().await.expect("failed to read response body");

            (status, text)
        })
    }

    pub async fn health_check(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/health_check", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Polls the coordinator until its session satisfies `predicate`.
    pub async fn wait_for_session<P>(&self, predicate: P) -> SessionSnapshot
    where
        P: Fn(&SessionSnapshot) -> bool,
    {
        timeout(TEST_TIMEOUT, async {
            loop {
                let snapshot = self.coordinator.snapshot();
                if predicate(&snapshot) {
                    return snapshot;
                }

                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("session did not reach the expected state before the timeout")
    }

    /// Waits until `count` contributions are pending in the open session.
    pub async fn wait_for_pending(&self, count: usize) -> SessionSnapshot {
        self.wait_for_session(|snapshot| {
            snapshot.phase == Phase::Open && snapshot.pending_count == count
        })
        .await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_test_app_with(ConcurrentReleasePolicy::Queue, 64).await
}

pub async fn spawn_test_app_with(
    concurrent_release: ConcurrentReleasePolicy,
    max_body_bytes: usize,
) -> TestApp {
    let base_address = "127.0.0.1";
    let listener =
        TcpListener::bind(format!("{base_address}:0")).expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = ApplicationSettings {
        host: base_address.to_string(),
        port,
        max_body_bytes,
    };

    let coordinator = Arc::new(Coordinator::new(&CoordinatorConfig { concurrent_release }));
    let dispatcher = WorkDispatcher::new(coordinator.clone(), Handle::current());

    let server = run(&settings, listener, dispatcher).expect("failed to bind address");
    let server_handle = tokio::spawn(server);

    TestApp {
        address: format!("http://{base_address}:{port}"),
        api_client: reqwest::Client::new(),
        coordinator,
        server_handle,
    }
}
