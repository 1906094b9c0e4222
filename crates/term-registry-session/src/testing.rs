//! Testing utilities for the session registry.
//!
//! Provides an in-memory [`SessionFactory`] that records every request it
//! receives, so registry behavior can be checked without a real session
//! layer.

use std::sync::Arc;

use parking_lot::Mutex;
use term_registry_core::{default_caption, Error, Result, SessionHandle, SessionMetadata};

use crate::backend::{SessionFactory, StartOptions, TerminalSession};

/// Everything a [`RecordingFactory`] has been asked to do.
#[derive(Debug, Default, Clone)]
pub struct FactoryLog {
    /// Metadata and options of every `create_session` call, in order
    pub started: Vec<(SessionMetadata, StartOptions)>,
    /// Handles passed to `connect`, in order
    pub connected: Vec<SessionHandle>,
    /// Handles passed to `interrupt_and_reap`, in order
    pub reaped: Vec<SessionHandle>,
}

#[derive(Debug, Default)]
struct FactoryState {
    log: FactoryLog,
    next_handle: u32,
    fail_reaps: bool,
    fail_connects: bool,
}

/// Session factory that assigns `handle-<n>` handles and records calls.
///
/// Clones share state, so a test can keep one clone while the registry
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl RecordingFactory {
    /// Create a factory whose operations all succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `interrupt_and_reap` call fail.
    pub fn fail_reaps(self) -> Self {
        self.state.lock().fail_reaps = true;
        self
    }

    /// Make every `connect` call fail.
    pub fn fail_connects(self) -> Self {
        self.state.lock().fail_connects = true;
        self
    }

    /// Snapshot of the recorded calls.
    pub fn log(&self) -> FactoryLog {
        self.state.lock().log.clone()
    }
}

impl SessionFactory for RecordingFactory {
    fn create_session(
        &self,
        metadata: &SessionMetadata,
        options: StartOptions,
    ) -> Box<dyn TerminalSession> {
        let mut state = self.state.lock();
        state.log.started.push((metadata.clone(), options));

        let mut metadata = metadata.clone();
        if !metadata.handle.is_assigned() {
            state.next_handle += 1;
            metadata.handle = SessionHandle::new(format!("handle-{}", state.next_handle));
        }
        if metadata.caption.is_empty() {
            metadata.caption = default_caption(metadata.sequence);
        }

        Box::new(RecordedSession {
            metadata,
            state: Arc::clone(&self.state),
        })
    }

    fn interrupt_and_reap(&self, handle: &SessionHandle) -> Result<()> {
        let mut state = self.state.lock();
        state.log.reaped.push(handle.clone());
        if state.fail_reaps {
            return Err(Error::Reap {
                handle: handle.clone(),
                reason: "simulated reap failure".to_string(),
            });
        }
        Ok(())
    }
}

struct RecordedSession {
    metadata: SessionMetadata,
    state: Arc<Mutex<FactoryState>>,
}

impl TerminalSession for RecordedSession {
    fn metadata(&self) -> SessionMetadata {
        self.metadata.clone()
    }

    fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.log.connected.push(self.metadata.handle.clone());
        if state.fail_connects {
            return Err(Error::Connect {
                handle: self.metadata.handle.clone(),
                reason: "simulated connect failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Metadata with an assigned handle, for tests that call `add` directly.
pub fn metadata(handle: &str, caption: &str, sequence: u32) -> SessionMetadata {
    let mut meta = SessionMetadata::new_named_terminal(sequence, caption, false);
    meta.handle = SessionHandle::new(handle);
    meta
}
