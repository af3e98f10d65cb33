//! Beacon Reporter - Fire-and-forget telemetry reporting
//!
//! Callers hand events to [`Reporter::report_event`], which returns
//! immediately. Delivery happens on background tasks:
//!
//! ```text
//! report_event ──► opt-out check ──► Enricher ──► shutting down? ──► TaskGroup::try_admit
//!                      │                              │                    │
//!                      └─ drop (debug)                └─ drop (debug)      ├─ full: drop (warn)
//!                                                                          └─ spawn delivery task
//!                                                                               │
//!                                                       child token + timeout ──► DeliveryClient
//! ```
//!
//! - **Admission**: at most `max_concurrent_reports` deliveries run at once.
//!   An event that finds the group full is dropped, never queued.
//! - **Failures**: delivery errors are logged at debug level and swallowed.
//! - **Lifecycle**: [`Reporter::shutdown`] drains in-flight deliveries up to a
//!   deadline, [`Reporter::close`] cancels them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use beacon_core::{ReporterConfig, TelemetryEvent};
//! use beacon_reporter::Reporter;
//!
//! # async fn example() -> Result<(), beacon_reporter::ReporterError> {
//! let config = ReporterConfig::new("https://telemetry.example.com").with_tags(["cli"]);
//! let reporter = Reporter::builder(config).build()?;
//!
//! reporter.report_event(TelemetryEvent::new("AppStarted").with_value("version", "1.2.3"));
//!
//! reporter.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

mod delivery;
pub mod enricher;
mod group;
pub mod lifecycle;
pub mod metrics;
pub mod reporter;

pub use enricher::Enricher;
pub use lifecycle::LifecycleState;
pub use metrics::{DeliveryOutcome, EventOutcome, MetricsSnapshot, ReporterMetrics};
pub use reporter::{Reporter, ReporterBuilder};

use thiserror::Error;

/// Errors surfaced by reporter construction and the lifecycle operations
///
/// Dropped events and failed deliveries are never reported through this
/// type; they only show up in logs and metrics.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// The reporter was built outside of a tokio runtime
    #[error("No tokio runtime available to run deliveries on")]
    NoRuntime,

    /// The metrics registry could not be set up
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// A delivery task panicked
    #[error("Delivery task panicked: {0}")]
    TaskPanicked(String),
}
