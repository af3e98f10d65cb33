//! Telemetry collector HTTP client
//!
//! ## Usage
//!
//! ```rust,no_run
//! use beacon_client::{DeliveryClient, HttpEventClient};
//! use beacon_core::TelemetryEvent;
//!
//! # async fn example() -> Result<(), beacon_client::DeliveryError> {
//! let client = HttpEventClient::new(reqwest::Client::new(), "https://telemetry.example.com");
//! client.report_event(&TelemetryEvent::new("AppStarted")).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use beacon_core::TelemetryEvent;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tracing::debug;

use crate::DeliveryError;

/// Path of the event ingestion endpoint, relative to the base URL
pub const EVENTS_PATH: &str = "/v1alpha1/events";

// ============================================================================
// DeliveryClient trait
// ============================================================================

/// Delivers one telemetry event with one network call
///
/// Implementations must not retry. Cancellation is done by dropping the
/// returned future, so implementations should hold no state that outlives it.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Sends `event` to the collector.
    async fn report_event(&self, event: &TelemetryEvent) -> Result<(), DeliveryError>;
}

// ============================================================================
// HttpEventClient
// ============================================================================

/// reqwest-based [`DeliveryClient`]
///
/// Encodes the event as JSON and POSTs it to `{base_url}/v1alpha1/events`.
/// Only `200 OK` counts as success.
#[derive(Debug, Clone)]
pub struct HttpEventClient {
    /// The underlying HTTP client (shared connection pool)
    client: Client,
    /// Base URL without a trailing slash
    base_url: String,
    /// Bearer token; empty means no `Authorization` header
    auth_token: String,
}

impl HttpEventClient {
    /// Creates a client for the collector at `base_url`.
    ///
    /// # Arguments
    /// * `client` - HTTP client to send requests with
    /// * `base_url` - Collector base URL, e.g. `"https://telemetry.example.com"`
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            auth_token: String::new(),
        }
    }

    /// Sets the bearer token sent with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Full URL of the ingestion endpoint.
    pub fn events_url(&self) -> String {
        format!("{}{}", self.base_url, EVENTS_PATH)
    }
}

#[async_trait]
impl DeliveryClient for HttpEventClient {
    async fn report_event(&self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(event)?;

        let mut request = self
            .client
            .post(self.events_url())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if !self.auth_token.is_empty() {
            request = request.bearer_auth(&self.auth_token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(DeliveryError::UnexpectedStatus(status));
        }

        debug!(name = %event.name, "Telemetry event accepted by collector");
        Ok(())
    }
}
