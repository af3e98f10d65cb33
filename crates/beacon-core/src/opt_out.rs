//! Opt-out signal
//!
//! The reporter asks an [`OptOutSignal`] before every report instead of
//! caching the answer at construction, so toggling the signal at runtime
//! takes effect on the very next event.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Conventional environment variable that disables telemetry.
pub const DO_NOT_TRACK_ENV: &str = "DO_NOT_TRACK";

/// A capability answering "has the user opted out of telemetry right now?"
pub trait OptOutSignal: Send + Sync {
    /// Returns `true` when no telemetry may be sent.
    fn is_active(&self) -> bool;
}

/// Opt-out read from an environment variable on every check
///
/// Any non-empty value disables reporting; an unset or empty variable
/// leaves it enabled.
#[derive(Debug, Clone)]
pub struct DoNotTrack {
    var: String,
}

impl DoNotTrack {
    /// Watches the given environment variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the watched variable.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for DoNotTrack {
    fn default() -> Self {
        Self::new(DO_NOT_TRACK_ENV)
    }
}

impl OptOutSignal for DoNotTrack {
    fn is_active(&self) -> bool {
        std::env::var_os(&self.var).is_some_and(|value| !value.is_empty())
    }
}

/// In-process opt-out switch
///
/// Clones share the same flag, so a handle kept by the application (or a
/// test) can flip the reporter's behavior at any time.
#[derive(Debug, Clone, Default)]
pub struct OptOutFlag(Arc<AtomicBool>);

impl OptOutFlag {
    /// Creates a flag in the given state.
    pub fn new(active: bool) -> Self {
        Self(Arc::new(AtomicBool::new(active)))
    }

    /// Turns the opt-out on or off.
    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::Release);
    }
}

impl OptOutSignal for OptOutFlag {
    fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
