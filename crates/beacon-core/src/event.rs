//! Telemetry event model
//!
//! These types are the JSON body posted to the collector. Every field is
//! omitted from the encoding when it is empty or zero, so a sparse event
//! produces a sparse document.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TelemetryEventKind
// ============================================================================

/// Severity of a telemetry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryEventKind {
    /// The event is informational
    Info,
    /// The event is a warning
    Warning,
    /// The event is an error
    Error,
}

impl TelemetryEventKind {
    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryEventKind::Info => "info",
            TelemetryEventKind::Warning => "warning",
            TelemetryEventKind::Error => "error",
        }
    }
}

impl std::fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TelemetryEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(TelemetryEventKind::Info),
            "warning" | "warn" => Ok(TelemetryEventKind::Warning),
            "error" => Ok(TelemetryEventKind::Error),
            other => Err(format!(
                "unknown event kind '{other}'; valid options: info, warning, error"
            )),
        }
    }
}

// ============================================================================
// StackFrame
// ============================================================================

/// One frame of a stack trace attached to an error event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// File name where the error occurred
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    /// Name of the function where the error occurred
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
    /// Line number in the file
    #[serde(default, skip_serializing_if = "is_zero")]
    pub line: i32,
    /// Column number in the line
    #[serde(default, skip_serializing_if = "is_zero")]
    pub column: i32,
}

impl StackFrame {
    /// Creates a frame pointing at `file:line` inside `function`.
    pub fn new(file: impl Into<String>, function: impl Into<String>, line: i32) -> Self {
        Self {
            file: file.into(),
            function: function.into(),
            line,
            column: 0,
        }
    }

    /// Sets the column number.
    pub fn with_column(mut self, column: i32) -> Self {
        self.column = column;
        self
    }
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

// ============================================================================
// TelemetryEvent
// ============================================================================

/// A discrete record describing something that happened in the host application
///
/// Callers usually fill in `name`, `kind`, `message` and `values`. The
/// reporter stamps `timestamp`, fills `session_id` when it is empty and
/// appends its configured tags before the event is handed to delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Session the event belongs to. Short-lived, never persisted; only
    /// links events that may be related.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    /// When the event was reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Severity of the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TelemetryEventKind>,
    /// Name of the event
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Free-form message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Arbitrary key/value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub values: HashMap<String, String>,
    /// Stack trace for error events, innermost frame first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<StackFrame>,
    /// Tags; caller tags come before the reporter's configured tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TelemetryEvent {
    /// Creates an event with the given name and nothing else set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the kind.
    pub fn with_kind(mut self, kind: TelemetryEventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Adds (or replaces) a single value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Appends a caller tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replaces the stack trace.
    pub fn with_stack_trace(mut self, frames: Vec<StackFrame>) -> Self {
        self.stack_trace = frames;
        self
    }

    /// Sets an explicit session id, overriding the reporter's.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }
}
