//! Reporter construction and the admission-controlled dispatcher
//!
//! [`Reporter::report_event`] is the hot path. It never blocks and never
//! returns an error: every event is either handed to a delivery task or
//! dropped on the spot with a log line and a metric.

use std::sync::Arc;
use std::time::Duration;

use beacon_client::{DeliveryClient, HttpEventClient};
use beacon_core::{
    DoNotTrack, OptOutSignal, ReporterConfig, SessionId, TelemetryEvent,
    MAX_CONCURRENT_REPORTS_LIMIT,
};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, info_span, warn, Instrument, Span};

use crate::delivery::deliver;
use crate::enricher::Enricher;
use crate::group::{AdmitError, TaskGroup};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::metrics::{EventOutcome, ReporterMetrics};
use crate::ReporterError;

// ============================================================================
// ReporterBuilder
// ============================================================================

/// Builds a [`Reporter`] from a [`ReporterConfig`] plus runtime injections
///
/// Everything except the config is optional:
/// - HTTP client: defaults to a fresh `reqwest::Client`
/// - delivery client: defaults to [`HttpEventClient`] over that HTTP client
/// - opt-out signal: defaults to [`DoNotTrack`] on `config.opt_out_env`
/// - parent token: cancelling it cancels every delivery of this reporter
/// - span: parent span for the reporter's log lines
pub struct ReporterBuilder {
    config: ReporterConfig,
    http_client: Option<reqwest::Client>,
    delivery_client: Option<Arc<dyn DeliveryClient>>,
    opt_out: Option<Arc<dyn OptOutSignal>>,
    parent: Option<CancellationToken>,
    span: Option<Span>,
}

impl ReporterBuilder {
    fn new(config: ReporterConfig) -> Self {
        Self {
            config,
            http_client: None,
            delivery_client: None,
            opt_out: None,
            parent: None,
            span: None,
        }
    }

    /// Uses `client` as the transport for the default [`HttpEventClient`].
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Replaces the delivery client entirely; `http_client` is then unused.
    pub fn delivery_client(mut self, client: Arc<dyn DeliveryClient>) -> Self {
        self.delivery_client = Some(client);
        self
    }

    /// Replaces the opt-out signal.
    pub fn opt_out(mut self, signal: Arc<dyn OptOutSignal>) -> Self {
        self.opt_out = Some(signal);
        self
    }

    /// Ties the reporter's cancellation scope to `token`.
    pub fn parent_token(mut self, token: CancellationToken) -> Self {
        self.parent = Some(token);
        self
    }

    /// Nests the reporter's span under `span`.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the reporter.
    ///
    /// Must be called from within a tokio runtime; deliveries are spawned on
    /// that runtime even when `report_event` is called from another thread.
    pub fn build(self) -> Result<Reporter, ReporterError> {
        let runtime = Handle::try_current().map_err(|_| ReporterError::NoRuntime)?;
        let metrics = Arc::new(ReporterMetrics::new()?);

        let config = self.config;
        let client: Arc<dyn DeliveryClient> = match self.delivery_client {
            Some(client) => client,
            None => {
                let http = self.http_client.unwrap_or_default();
                Arc::new(
                    HttpEventClient::new(http, config.base_url.clone())
                        .with_auth_token(config.auth_token.clone()),
                )
            }
        };
        let opt_out: Arc<dyn OptOutSignal> = match self.opt_out {
            Some(signal) => signal,
            None => Arc::new(DoNotTrack::new(config.opt_out_env.clone())),
        };

        let session_id = SessionId::generate();
        let span = match self.span {
            Some(parent) => {
                info_span!(parent: &parent, "telemetry_reporter", session_id = %session_id)
            }
            None => info_span!("telemetry_reporter", session_id = %session_id),
        };

        let parent = self.parent.unwrap_or_default();
        // A zero-sized group would silently drop everything.
        let capacity = config
            .max_concurrent_reports
            .clamp(1, MAX_CONCURRENT_REPORTS_LIMIT);
        let delivery_timeout = config.delivery_timeout();

        debug!(
            parent: &span,
            base_url = %config.base_url,
            max_concurrent_reports = capacity,
            "Telemetry reporter created"
        );

        Ok(Reporter {
            enricher: Enricher::new(session_id, config.tags),
            client,
            opt_out,
            group: TaskGroup::new(&parent, capacity),
            lifecycle: Lifecycle::new(),
            runtime,
            delivery_timeout,
            metrics,
            span,
        })
    }
}

// ============================================================================
// Reporter
// ============================================================================

/// Best-effort, non-blocking telemetry reporter
///
/// Created by [`Reporter::builder`], terminated by exactly one of
/// [`Reporter::shutdown`] (graceful) or [`Reporter::close`] (abrupt).
/// Dropping a reporter that was never terminated cancels its deliveries.
pub struct Reporter {
    enricher: Enricher,
    client: Arc<dyn DeliveryClient>,
    opt_out: Arc<dyn OptOutSignal>,
    pub(crate) group: TaskGroup,
    pub(crate) lifecycle: Lifecycle,
    runtime: Handle,
    delivery_timeout: Duration,
    metrics: Arc<ReporterMetrics>,
    pub(crate) span: Span,
}

impl Reporter {
    /// Starts building a reporter for `config`.
    pub fn builder(config: ReporterConfig) -> ReporterBuilder {
        ReporterBuilder::new(config)
    }

    /// Reports a telemetry event, fire-and-forget.
    ///
    /// 1. Opt-out active: dropped before anything else happens
    /// 2. Enriched with timestamp, session id and default tags
    /// 3. Shutting down: dropped
    /// 4. No free delivery slot: dropped, never queued
    /// 5. Otherwise delivered on a background task
    pub fn report_event(&self, mut event: TelemetryEvent) {
        let _entered = self.span.enter();

        if self.opt_out.is_active() {
            debug!("Telemetry is disabled, dropping event");
            self.metrics.record_event(EventOutcome::OptedOut);
            return;
        }

        self.enricher.enrich(&mut event);

        if self.lifecycle.is_shutting_down() {
            self.drop_while_shutting_down();
            return;
        }

        let admission = match self.group.try_admit() {
            Ok(admission) => admission,
            Err(AdmitError::Full) if !self.lifecycle.is_shutting_down() => {
                warn!(
                    max_concurrent_reports = self.group.capacity(),
                    "Too many in-flight telemetry reports, dropping event"
                );
                self.metrics.record_event(EventOutcome::Saturated);
                return;
            }
            Err(_) => {
                self.drop_while_shutting_down();
                return;
            }
        };

        // Shutdown may have begun between the first check and the permit.
        if self.lifecycle.is_shutting_down() {
            drop(admission);
            self.drop_while_shutting_down();
            return;
        }

        self.metrics.record_event(EventOutcome::Admitted);

        let span = debug_span!(parent: &self.span, "deliver_event", name = %event.name);
        let client = Arc::clone(&self.client);
        let metrics = Arc::clone(&self.metrics);
        let cancel = self.group.token().child_token();
        let timeout = self.delivery_timeout;

        admission.spawn(
            &self.runtime,
            async move {
                deliver(client, event, cancel, timeout, metrics).await;
            }
            .instrument(span),
        );
    }

    fn drop_while_shutting_down(&self) {
        debug!("Shutting down, dropping event");
        self.metrics.record_event(EventOutcome::ShuttingDown);
    }

    /// Session id stamped on events that carry none.
    pub fn session_id(&self) -> &SessionId {
        self.enricher.session_id()
    }

    /// Tags appended to every event.
    pub fn tags(&self) -> &[String] {
        self.enricher.tags()
    }

    /// Maximum number of deliveries in flight.
    pub fn max_concurrent_reports(&self) -> usize {
        self.group.capacity()
    }

    /// Number of delivery tasks currently running.
    pub fn in_flight(&self) -> usize {
        self.group.len()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Metrics registry of this reporter.
    pub fn metrics(&self) -> Arc<ReporterMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if self.lifecycle.state() != LifecycleState::Terminated {
            self.lifecycle.begin_shutdown();
            self.group.cancel();
            debug!(parent: &self.span, "Reporter dropped without shutdown, cancelling deliveries");
        }
    }
}
