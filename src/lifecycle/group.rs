//! Supervision group: tasks that live, fail and stop together.
//!
//! # Responsibilities
//! - Spawn and track every supervised task
//! - Share one cancellation signal among them
//! - Keep the first reported error; cancel everything when it arrives
//! - Report the group outcome once all tasks have finished
//!
//! # Design Decisions
//! - Cancellation is a durable state (`CancellationToken`), so tasks that start
//!   waiting after the fact still observe it
//! - First error wins; later ones are logged and dropped
//! - Panics are caught and reported like any other failure

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::SupervisorError;

struct Inner {
    tracker: TaskTracker,
    token: CancellationToken,
    first_error: Mutex<Option<Arc<SupervisorError>>>,
    registered: AtomicUsize,
}

/// A set of concurrently running tasks sharing one cancellation signal and
/// one first-error outcome.
///
/// Cloning yields another handle to the same group.
#[derive(Clone)]
pub struct SupervisionGroup {
    inner: Arc<Inner>,
}

impl SupervisionGroup {
    /// Create a group with its own cancellation signal.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Create a group that is also cancelled when `parent` is.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self::from_token(parent.child_token())
    }

    fn from_token(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                tracker: TaskTracker::new(),
                token,
                first_error: Mutex::new(None),
                registered: AtomicUsize::new(0),
            }),
        }
    }

    /// Spawn a supervised task.
    ///
    /// An `Err` returned by the task becomes the group error if none is stored
    /// yet, and cancels the group either way.
    pub fn spawn<F, E>(&self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<SupervisorError> + Send + 'static,
    {
        let name = name.into();
        let group = self.clone();
        self.inner.registered.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(task = %name, "Registered supervised task");

        self.inner.tracker.spawn(async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => {
                    tracing::trace!(task = %name, "Supervised task finished");
                }
                Ok(Err(e)) => group.report_error(e.into()),
                Err(panic) => {
                    let message = if let Some(s) = panic.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    group.report_error(SupervisorError::TaskPanicked {
                        task: name,
                        message,
                    });
                }
            }
        });
    }

    /// Record a fatal error and cancel the group. Only the first error is kept.
    pub fn report_error(&self, err: SupervisorError) {
        {
            let mut slot = self
                .inner
                .first_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                tracing::error!(error = %err, "Supervised task failed, cancelling group");
                *slot = Some(Arc::new(err));
            } else {
                tracing::warn!(error = %err, "Supervised task failed after group failure");
            }
        }
        self.inner.token.cancel();
    }

    /// Cancel the group without an error.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Resolves once the group is cancelled, immediately if it already is.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }

    /// The group's cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    /// Number of tasks ever spawned into this group.
    pub fn registered(&self) -> usize {
        self.inner.registered.load(Ordering::SeqCst)
    }

    /// Number of tasks still running.
    pub fn running(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Wait for every task to finish and return the group outcome.
    ///
    /// The outcome is stable: every call on a failed group returns the same
    /// first error.
    pub async fn wait(&self) -> Result<(), Arc<SupervisorError>> {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;

        let first_error = self
            .inner
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for SupervisionGroup {
    fn default() -> Self {
        Self::new()
    }
}
