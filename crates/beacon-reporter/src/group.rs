//! Bounded task group
//!
//! A semaphore-guarded spawner with a shared cancellation scope and a join
//! barrier. Admission never waits: when every permit is taken the caller is
//! told so immediately and decides what to drop.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::ReporterError;

/// Why a task could not be admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdmitError {
    /// Every permit is held by a running task
    Full,
    /// The group has been drained and accepts nothing anymore
    Closed,
}

/// Fixed-capacity group of cancellable tasks
pub(crate) struct TaskGroup {
    /// One permit per task slot; a task holds its permit until it ends
    permits: Arc<Semaphore>,
    capacity: usize,
    /// Join barrier over every spawned task
    tracker: TaskTracker,
    /// Parent of every task's cancellation token
    token: CancellationToken,
    /// First panic observed in a task, reported by `wait`
    first_panic: Arc<Mutex<Option<String>>>,
}

/// A reserved slot in the group; spawning consumes it, dropping frees it
pub(crate) struct Admission<'a> {
    group: &'a TaskGroup,
    permit: OwnedSemaphorePermit,
}

impl TaskGroup {
    /// Creates a group whose token is a child of `parent`.
    pub(crate) fn new(parent: &CancellationToken, capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            tracker: TaskTracker::new(),
            token: parent.child_token(),
            first_panic: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shared cancellation scope of the group.
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of tasks that have been spawned and not yet finished.
    pub(crate) fn len(&self) -> usize {
        self.tracker.len()
    }

    /// Tries to reserve a slot without waiting.
    pub(crate) fn try_admit(&self) -> Result<Admission<'_>, AdmitError> {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => Ok(Admission {
                group: self,
                permit,
            }),
            Err(TryAcquireError::NoPermits) => Err(AdmitError::Full),
            Err(TryAcquireError::Closed) => Err(AdmitError::Closed),
        }
    }

    /// Cancels the shared token, and with it every task's child token.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits until every admitted task has finished, then closes the group.
    ///
    /// Once this has started, `try_admit` fails: the pending reservation of
    /// all permits sits ahead of any new admission. Safe to call again after
    /// a previous call was dropped or completed.
    pub(crate) async fn wait(&self) -> Result<(), ReporterError> {
        self.tracker.close();

        let capacity = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        if let Ok(all) = self.permits.acquire_many(capacity).await {
            all.forget();
        }
        self.permits.close();

        self.tracker.wait().await;

        let panic = self
            .first_panic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match panic {
            Some(message) => Err(ReporterError::TaskPanicked(message)),
            None => Ok(()),
        }
    }
}

impl Admission<'_> {
    /// Spawns `task` on `runtime`, holding the slot until it finishes.
    ///
    /// A panic inside `task` is caught and recorded for `TaskGroup::wait`;
    /// it does not affect sibling tasks.
    pub(crate) fn spawn<F>(self, runtime: &Handle, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self.permit;
        let first_panic = Arc::clone(&self.group.first_panic);

        self.group.tracker.spawn_on(
            async move {
                let _permit = permit;
                if let Err(payload) = AssertUnwindSafe(task).catch_unwind().await {
                    let message = panic_message(payload.as_ref());
                    first_panic
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get_or_insert(message);
                }
            },
            runtime,
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
