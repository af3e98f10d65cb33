//! Shared helpers for reporter integration tests

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use beacon_client::{DeliveryClient, DeliveryError};
use beacon_core::{OptOutFlag, ReporterConfig, TelemetryEvent};
use beacon_reporter::Reporter;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts a mock collector answering `POST /v1alpha1/events` with `status`.
pub async fn mock_collector(status: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1alpha1/events"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    server
}

/// Decodes every event the mock collector has received so far.
pub async fn received_events(server: &MockServer) -> Vec<TelemetryEvent> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("valid event body"))
        .collect()
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Builds a reporter around `client` with opt-out forced off, so the
/// tests do not depend on the environment they run in.
pub fn reporter_with(config: ReporterConfig, client: Arc<dyn DeliveryClient>) -> Reporter {
    Reporter::builder(config)
        .delivery_client(client)
        .opt_out(Arc::new(OptOutFlag::new(false)))
        .build()
        .expect("build reporter")
}

/// Builds a reporter that posts to `server`, with opt-out forced off.
pub fn reporter_for(server: &MockServer, config: ReporterConfig) -> Reporter {
    let config = ReporterConfig {
        base_url: server.uri(),
        ..config
    };
    Reporter::builder(config)
        .opt_out(Arc::new(OptOutFlag::new(false)))
        .build()
        .expect("build reporter")
}

// ============================================================================
// Fake delivery clients
// ============================================================================

/// Delivery client that holds every delivery until the gate is opened
pub struct GatedClient {
    gate: watch::Sender<bool>,
    fail: bool,
    started: AtomicUsize,
    delivered: Mutex<Vec<TelemetryEvent>>,
}

impl GatedClient {
    pub fn new() -> Arc<Self> {
        Self::build(false)
    }

    /// Like `new`, but every delivery fails once the gate opens.
    pub fn failing() -> Arc<Self> {
        Self::build(true)
    }

    fn build(fail: bool) -> Arc<Self> {
        let (gate, _) = watch::channel(false);
        Arc::new(Self {
            gate,
            fail,
            started: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        })
    }

    /// Lets every pending and future delivery proceed.
    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Number of deliveries that reached the client.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Events whose delivery completed successfully.
    pub fn delivered(&self) -> Vec<TelemetryEvent> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryClient for GatedClient {
    async fn report_event(&self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
        self.started.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if self.fail {
            return Err(DeliveryError::UnexpectedStatus(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        self.delivered.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Delivery client whose every delivery panics
pub struct PanickingClient;

#[async_trait]
impl DeliveryClient for PanickingClient {
    async fn report_event(&self, _event: &TelemetryEvent) -> Result<(), DeliveryError> {
        panic!("collector exploded");
    }
}
