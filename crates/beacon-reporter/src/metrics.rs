//! Prometheus metrics for the reporter
//!
//! Dropped events and failed deliveries never reach the caller, so these
//! counters are the only aggregate record of what the reporter did.

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// What happened to an event handed to `report_event`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Accepted for delivery
    Admitted,
    /// Dropped because the opt-out signal was active
    OptedOut,
    /// Dropped because the reporter was shutting down
    ShuttingDown,
    /// Dropped because every delivery slot was busy
    Saturated,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Admitted => "admitted",
            EventOutcome::OptedOut => "opted_out",
            EventOutcome::ShuttingDown => "shutting_down",
            EventOutcome::Saturated => "saturated",
        }
    }
}

/// How a delivery task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The collector accepted the event
    Delivered,
    /// The delivery client returned an error
    Failed,
    /// The absolute per-delivery timeout elapsed
    TimedOut,
    /// The reporter cancelled the delivery
    Cancelled,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Failed => "failed",
            DeliveryOutcome::TimedOut => "timed_out",
            DeliveryOutcome::Cancelled => "cancelled",
        }
    }
}

/// Point-in-time copy of the reporter counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub admitted: u64,
    pub opted_out: u64,
    pub shutting_down: u64,
    pub saturated: u64,
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub in_flight: i64,
}

/// Metrics registry owned by one reporter.
pub struct ReporterMetrics {
    registry: Registry,
    /// Counter: events by admission outcome
    pub events_total: IntCounterVec,
    /// Counter: finished deliveries by result
    pub deliveries_total: IntCounterVec,
    /// Gauge: deliveries currently running
    pub deliveries_in_flight: IntGauge,
    /// Histogram: delivery duration in seconds
    pub delivery_duration_seconds: Histogram,
}

impl ReporterMetrics {
    /// Creates a `ReporterMetrics` with all metrics registered.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("beacon".to_string()), None)?;

        let events_total = IntCounterVec::new(
            Opts::new("events_total", "Reported events by admission outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let deliveries_total = IntCounterVec::new(
            Opts::new("deliveries_total", "Finished deliveries by result"),
            &["result"],
        )?;
        registry.register(Box::new(deliveries_total.clone()))?;

        let deliveries_in_flight = IntGauge::new(
            "deliveries_in_flight",
            "Deliveries currently in flight",
        )?;
        registry.register(Box::new(deliveries_in_flight.clone()))?;

        let delivery_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "delivery_duration_seconds",
                "Time spent delivering one event",
            )
            .buckets(vec![0.05, 0.25, 1.0, 5.0, 30.0, f64::INFINITY]),
        )?;
        registry.register(Box::new(delivery_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            events_total,
            deliveries_total,
            deliveries_in_flight,
            delivery_duration_seconds,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Record the admission outcome of one event.
    pub fn record_event(&self, outcome: EventOutcome) {
        self.events_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Record a finished delivery and how long it took.
    pub fn record_delivery(&self, outcome: DeliveryOutcome, elapsed: Duration) {
        self.deliveries_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.delivery_duration_seconds
            .observe(elapsed.as_secs_f64());
    }

    /// Counts one delivery as in flight until the guard is dropped.
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.deliveries_in_flight.inc();
        InFlightGuard {
            gauge: self.deliveries_in_flight.clone(),
        }
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let event = |outcome: EventOutcome| {
            self.events_total
                .with_label_values(&[outcome.as_str()])
                .get()
        };
        let delivery = |outcome: DeliveryOutcome| {
            self.deliveries_total
                .with_label_values(&[outcome.as_str()])
                .get()
        };

        MetricsSnapshot {
            admitted: event(EventOutcome::Admitted),
            opted_out: event(EventOutcome::OptedOut),
            shutting_down: event(EventOutcome::ShuttingDown),
            saturated: event(EventOutcome::Saturated),
            delivered: delivery(DeliveryOutcome::Delivered),
            failed: delivery(DeliveryOutcome::Failed),
            timed_out: delivery(DeliveryOutcome::TimedOut),
            cancelled: delivery(DeliveryOutcome::Cancelled),
            in_flight: self.deliveries_in_flight.get(),
        }
    }

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Decrements the in-flight gauge on drop
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
