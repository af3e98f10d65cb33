//! Reporter lifecycle: Running → ShuttingDown → Terminated
//!
//! The shutting-down flag is set before any draining starts, so an event
//! reported concurrently with `shutdown` or `close` is either admitted
//! before the drain or dropped. It is never spawned into a group that has
//! already been waited on.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::reporter::Reporter;
use crate::ReporterError;

/// Observable lifecycle state of a [`Reporter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting events
    Running,
    /// Rejecting events, deliveries still draining
    ShuttingDown,
    /// Every delivery has finished
    Terminated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags behind [`LifecycleState`]; both only ever go from false to true
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    shutting_down: AtomicBool,
    terminated: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    pub(crate) fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(crate) fn state(&self) -> LifecycleState {
        if self.is_terminated() {
            LifecycleState::Terminated
        } else if self.is_shutting_down() {
            LifecycleState::ShuttingDown
        } else {
            LifecycleState::Running
        }
    }
}

impl Reporter {
    /// Stops accepting events and waits for in-flight deliveries.
    ///
    /// If they have not all finished after `timeout`, falls back to
    /// [`Reporter::close`]. Calling it on a terminated reporter is a no-op.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ReporterError> {
        self.shutdown_until(tokio::time::sleep(timeout)).await
    }

    /// Like [`Reporter::shutdown`], with the deadline given as a future.
    ///
    /// The drain is abandoned, and the remaining deliveries cancelled, as
    /// soon as `deadline` completes.
    pub async fn shutdown_until<F>(&self, deadline: F) -> Result<(), ReporterError>
    where
        F: Future<Output = ()>,
    {
        self.lifecycle.begin_shutdown();
        if self.lifecycle.is_terminated() {
            return Ok(());
        }

        info!(
            parent: &self.span,
            in_flight = self.group.len(),
            "Shutting down telemetry reporter"
        );

        let result = tokio::select! {
            biased;
            result = self.group.wait() => result,
            _ = deadline => {
                debug!(parent: &self.span, "Shutdown deadline reached, cancelling deliveries");
                return self.close().await;
            }
        };

        self.lifecycle.mark_terminated();
        result
    }

    /// Stops accepting events and cancels in-flight deliveries.
    ///
    /// Returns once every delivery task has unwound. Cancellation itself is
    /// not an error; only a panicked delivery task is reported.
    pub async fn close(&self) -> Result<(), ReporterError> {
        self.lifecycle.begin_shutdown();
        if self.lifecycle.is_terminated() {
            return Ok(());
        }

        debug!(parent: &self.span, in_flight = self.group.len(), "Closing telemetry reporter");

        self.group.cancel();
        let result = self.group.wait().await;

        self.lifecycle.mark_terminated();
        result
    }
}
