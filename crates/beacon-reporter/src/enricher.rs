//! Event enrichment
//!
//! Stamps every event with what the reporter knows and the caller does not:
//! the report time, the session id and the configured tags.

use beacon_core::{SessionId, TelemetryEvent};
use chrono::Utc;

/// Fills reporter-level fields into events before admission
#[derive(Debug, Clone)]
pub struct Enricher {
    session_id: SessionId,
    tags: Vec<String>,
}

impl Enricher {
    /// Creates an enricher for the given session and default tags.
    pub fn new(session_id: SessionId, tags: Vec<String>) -> Self {
        Self { session_id, tags }
    }

    /// Session id stamped on events that carry none.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Tags appended to every event.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Enriches `event` in place.
    ///
    /// - `timestamp` is always set to now, replacing any caller value
    /// - `session_id` is set only when empty
    /// - configured tags are appended after the caller's own tags
    pub fn enrich(&self, event: &mut TelemetryEvent) {
        event.timestamp = Some(Utc::now());

        if event.session_id.is_empty() {
            event.session_id = self.session_id.as_str().to_string();
        }

        event.tags.extend(self.tags.iter().cloned());
    }
}
