//! Beacon Client - Delivery of telemetry events to the collector
//!
//! Provides:
//! - [`DeliveryClient`](client::DeliveryClient): the one-event, one-call seam the reporter delivers through
//! - [`HttpEventClient`](client::HttpEventClient): reqwest implementation posting JSON to
//!   `{base_url}/v1alpha1/events`
//!
//! The client never retries. Every failure is returned as a [`DeliveryError`]
//! and it is up to the caller to decide whether anyone hears about it.

pub mod client;

pub use client::{DeliveryClient, HttpEventClient, EVENTS_PATH};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while delivering a single event
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The event could not be encoded as JSON
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    /// The request could not be built or sent, or the connection failed
    #[error("Failed to send request: {0}")]
    Request(#[from] reqwest::Error),

    /// The collector answered with anything other than 200 OK
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),
}
