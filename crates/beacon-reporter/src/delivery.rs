//! Body of one delivery task.

use std::sync::Arc;
use std::time::Duration;

use beacon_client::DeliveryClient;
use beacon_core::TelemetryEvent;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::metrics::{DeliveryOutcome, ReporterMetrics};

/// Delivers `event` once, giving up on cancellation or after `timeout`.
///
/// Every failure ends here as a debug log line and a metric; nothing is
/// returned, so one bad delivery cannot affect its siblings.
pub(crate) async fn deliver(
    client: Arc<dyn DeliveryClient>,
    event: TelemetryEvent,
    cancel: CancellationToken,
    timeout: Duration,
    metrics: Arc<ReporterMetrics>,
) {
    let _in_flight = metrics.in_flight_guard();
    let started = Instant::now();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Delivery cancelled");
            DeliveryOutcome::Cancelled
        }
        result = tokio::time::timeout(timeout, client.report_event(&event)) => match result {
            Ok(Ok(())) => DeliveryOutcome::Delivered,
            Ok(Err(e)) => {
                // Offline users would otherwise get a warning per event.
                debug!(error = %e, "Failed to report event");
                DeliveryOutcome::Failed
            }
            Err(_) => {
                debug!(timeout_secs = timeout.as_secs(), "Timed out reporting event");
                DeliveryOutcome::TimedOut
            }
        },
    };

    metrics.record_delivery(outcome, started.elapsed());
}
