//! Send command - Report one telemetry event
//!
//! Provides the `beacon send` CLI command which:
//! 1. Loads the configuration and applies command-line overrides
//! 2. Builds a reporter and hands it a single event
//! 3. Shuts the reporter down gracefully and prints what happened to the event

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use beacon_core::{TelemetryEvent, TelemetryEventKind};
use beacon_reporter::{MetricsSnapshot, Reporter};
use clap::Args;
use tracing::info;

use super::effective_config;
use crate::output::{OutputFormat, Status};

#[derive(Debug, Args)]
pub struct SendCommand {
    /// Event name
    #[arg(long)]
    pub name: String,

    /// Event kind: info, warning or error
    #[arg(long, default_value = "info")]
    pub kind: TelemetryEventKind,

    /// Free-form message
    #[arg(long)]
    pub message: Option<String>,

    /// Key/value pair attached to the event (repeatable): --value key=value
    #[arg(long = "value", value_parser = parse_key_value)]
    pub values: Vec<(String, String)>,

    /// Tag attached to the event (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Collector base URL, overriding the configuration
    #[arg(long)]
    pub base_url: Option<String>,

    /// Seconds to wait for delivery before cancelling it
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl SendCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let mut config = effective_config(config_path);
        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.clone();
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::bail!("Invalid configuration: {}", messages.join("; "));
        }

        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.shutdown_timeout());

        info!(base_url = %config.base_url, name = %self.name, "Sending telemetry event");
        let base_url = config.base_url.clone();

        let reporter = Reporter::builder(config)
            .build()
            .context("Failed to create telemetry reporter")?;

        reporter.report_event(self.event());
        reporter
            .shutdown(timeout)
            .await
            .context("Telemetry reporter did not shut down cleanly")?;

        let snapshot = reporter.metrics().snapshot();
        let result = delivery_result(&snapshot);

        let status = match result {
            "delivered" => Status::Ok,
            "opted_out" => Status::Warning,
            _ => Status::Error,
        };

        let message = match result {
            "delivered" => format!("Event '{}' delivered", self.name),
            "opted_out" => "Telemetry is disabled; event was not sent".to_string(),
            other => format!("Event '{}' not delivered: {}", self.name, other),
        };

        formatter.result(
            status,
            &message,
            serde_json::json!({
                "result": result,
                "session_id": reporter.session_id().as_str(),
                "name": self.name,
                "base_url": base_url,
                "metrics": {
                    "admitted": snapshot.admitted,
                    "opted_out": snapshot.opted_out,
                    "delivered": snapshot.delivered,
                    "failed": snapshot.failed,
                    "timed_out": snapshot.timed_out,
                    "cancelled": snapshot.cancelled,
                },
            }),
        );
        formatter.field("Session", reporter.session_id().as_str());
        formatter.field("Collector", &base_url);

        Ok(())
    }

    fn event(&self) -> TelemetryEvent {
        let mut event = TelemetryEvent::new(self.name.clone()).with_kind(self.kind);
        if let Some(ref message) = self.message {
            event = event.with_message(message.clone());
        }
        for (key, value) in &self.values {
            event = event.with_value(key.clone(), value.clone());
        }
        for tag in &self.tags {
            event = event.with_tag(tag.clone());
        }
        event
    }
}

/// Summarizes what happened to the single event a `send` reported.
fn delivery_result(snapshot: &MetricsSnapshot) -> &'static str {
    if snapshot.opted_out > 0 {
        "opted_out"
    } else if snapshot.delivered > 0 {
        "delivered"
    } else if snapshot.timed_out > 0 {
        "timed_out"
    } else if snapshot.cancelled > 0 {
        "cancelled"
    } else if snapshot.failed > 0 {
        "failed"
    } else {
        "dropped"
    }
}

/// Parses a `key=value` argument; the value may itself contain `=`.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}
