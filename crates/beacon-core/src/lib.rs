//! Beacon Core - Shared model for the telemetry reporter
//!
//! This crate contains the pieces every other Beacon crate agrees on:
//! - **Event model** - `TelemetryEvent`, `TelemetryEventKind`, `StackFrame` (the wire format)
//! - **Identifiers** - short random session identifiers
//! - **Opt-out** - the `OptOutSignal` capability checked before every report
//! - **Configuration** - YAML-backed `ReporterConfig` with validation
//!
//! Nothing in here performs I/O on the network; delivery lives in
//! `beacon-client` and the concurrency machinery in `beacon-reporter`.

pub mod config;
pub mod event;
pub mod id;
pub mod opt_out;

pub use config::{ReporterConfig, ValidationError, MAX_CONCURRENT_REPORTS_LIMIT};
pub use event::{StackFrame, TelemetryEvent, TelemetryEventKind};
pub use id::{generate_id, SessionId};
pub use opt_out::{DoNotTrack, OptOutFlag, OptOutSignal, DO_NOT_TRACK_ENV};
