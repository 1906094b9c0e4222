//! Ingestion of asynchronous session notifications.
//!
//! The session layer reports subprocess presence and working-directory
//! changes out of band. Each notification is folded into the registry
//! through the same locked mutation path as direct calls. Notifications for
//! sessions that are no longer tracked are dropped: the session may have
//! been removed between the event's origin and its delivery.

use term_registry_core::SessionHandle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::registry::SessionRegistry;

/// Notification delivered by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session gained or lost child processes.
    SubprocessesChanged {
        /// Session the notification is about
        handle: SessionHandle,
        /// Whether the session now has child processes
        has_subprocesses: bool,
    },
    /// A session's shell changed directory.
    WorkingDirectoryChanged {
        /// Session the notification is about
        handle: SessionHandle,
        /// New working directory
        cwd: String,
    },
}

impl SessionEvent {
    /// Session the notification is about.
    pub fn handle(&self) -> &SessionHandle {
        match self {
            Self::SubprocessesChanged { handle, .. } => handle,
            Self::WorkingDirectoryChanged { handle, .. } => handle,
        }
    }
}

impl SessionRegistry {
    /// Apply one notification.
    pub fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SubprocessesChanged {
                handle,
                has_subprocesses,
            } => self.on_subprocesses_changed(&handle, has_subprocesses),
            SessionEvent::WorkingDirectoryChanged { handle, cwd } => {
                self.on_working_directory_changed(&handle, &cwd)
            }
        }
    }

    /// Record subprocess presence and republish the busy aggregate.
    pub fn on_subprocesses_changed(&self, handle: &SessionHandle, has_subprocesses: bool) {
        if !self.set_child_processes(handle, has_subprocesses) {
            debug!("Dropping subprocess notification for untracked session {}", handle);
        }
    }

    /// Record a working-directory change. Does not touch the busy aggregate.
    pub fn on_working_directory_changed(&self, handle: &SessionHandle, cwd: &str) {
        if self.set_working_directory(handle, cwd) {
            debug!("Session {} now in {}", handle, cwd);
        }
    }
}

/// Registration of a registry's handlers against a notification channel.
///
/// A background task feeds every received [`SessionEvent`] into the
/// registry. Dropping the guard aborts the task, unsubscribing the
/// handlers.
#[derive(Debug)]
pub struct EventIngestion {
    task: Option<JoinHandle<()>>,
}

impl EventIngestion {
    /// Start feeding `events` into `registry`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(registry: SessionRegistry, mut events: mpsc::Receiver<SessionEvent>) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                registry.handle_event(event);
            }
            debug!("Notification source closed, event ingestion stopped");
        });

        Self { task: Some(task) }
    }

    /// Whether the ingestion task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop ingesting and wait for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for EventIngestion {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
