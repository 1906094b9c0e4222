//! Bookkeeping-only session layer.
//!
//! Stands in for a real process backend: it assigns handles, names new
//! sessions, and remembers which handles currently have a live process so
//! reconnects can be told apart from relaunches. No processes are spawned.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use term_registry_core::{default_caption, Error, Result, SessionHandle, SessionMetadata};
use term_registry_session::{SessionFactory, StartOptions, TerminalSession};
use tracing::{debug, info};
use uuid::Uuid;

/// Session factory that tracks live handles in memory.
#[derive(Debug, Clone, Default)]
pub struct LocalSessionFactory {
    live: Arc<Mutex<HashSet<SessionHandle>>>,
}

impl LocalSessionFactory {
    /// Create a factory with no live sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `handle` has a live (connected, not reaped) process.
    pub fn is_live(&self, handle: &SessionHandle) -> bool {
        self.live.lock().contains(handle)
    }

    /// Number of live processes.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl SessionFactory for LocalSessionFactory {
    fn create_session(
        &self,
        metadata: &SessionMetadata,
        options: StartOptions,
    ) -> Box<dyn TerminalSession> {
        let mut metadata = metadata.clone();
        if !metadata.handle.is_assigned() {
            metadata.handle = SessionHandle::new(Uuid::new_v4().simple().to_string());
        }
        if metadata.caption.is_empty() {
            metadata.caption = default_caption(metadata.sequence);
        }

        debug!(
            "Materialized session {} ('{}', blinking_cursor={}, focus={})",
            metadata.handle, metadata.caption, options.blinking_cursor, options.focus
        );

        Box::new(LocalSession {
            metadata,
            live: Arc::clone(&self.live),
        })
    }

    fn interrupt_and_reap(&self, handle: &SessionHandle) -> Result<()> {
        if self.live.lock().remove(handle) {
            info!("Reaped session {}", handle);
            Ok(())
        } else {
            Err(Error::Reap {
                handle: handle.clone(),
                reason: "no live process".to_string(),
            })
        }
    }
}

struct LocalSession {
    metadata: SessionMetadata,
    live: Arc<Mutex<HashSet<SessionHandle>>>,
}

impl TerminalSession for LocalSession {
    fn metadata(&self) -> SessionMetadata {
        self.metadata.clone()
    }

    fn connect(&mut self) -> Result<()> {
        let handle = &self.metadata.handle;
        if self.live.lock().insert(handle.clone()) {
            info!(
                "Launched {:?} shell for session {} ({})",
                self.metadata.shell_type,
                handle,
                self.metadata.dimensions()
            );
        } else {
            info!("Resumed live session {}", handle);
        }
        Ok(())
    }
}
