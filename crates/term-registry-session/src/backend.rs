//! Collaborator interfaces consumed by the registry.
//!
//! The registry never spawns or talks to processes itself. It drives the
//! external session layer through these traits, which are supplied at
//! construction so tests can substitute fakes.

use term_registry_core::{PreferenceSettings, Result, SessionHandle, SessionMetadata};

/// Presentation options passed down when a session is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOptions {
    /// Render a blinking cursor
    pub blinking_cursor: bool,
    /// Give the new session input focus
    pub focus: bool,
}

/// A transient live session object produced by a [`SessionFactory`].
///
/// The registry uses it only at creation/reconnection time to read the
/// session's metadata and to ask it to connect, then drops it.
pub trait TerminalSession: Send {
    /// Snapshot of the session's current metadata.
    fn metadata(&self) -> SessionMetadata;

    /// Handle assigned by the backing process layer.
    fn handle(&self) -> SessionHandle {
        self.metadata().handle
    }

    /// Begin running: attach to an existing process or launch a new one.
    ///
    /// Failures are reported through the session's own lifecycle; the
    /// registry only logs them.
    fn connect(&mut self) -> Result<()>;
}

/// The external session layer.
pub trait SessionFactory: Send + Sync {
    /// Materialize a live session from `metadata`.
    ///
    /// # Arguments
    ///
    /// * `metadata` - Description of the session. An unassigned handle asks
    ///   for a new backing process; an assigned one asks to resume it.
    /// * `options` - Presentation preferences for the session
    ///
    /// # Returns
    ///
    /// A session whose metadata carries an assigned handle.
    fn create_session(
        &self,
        metadata: &SessionMetadata,
        options: StartOptions,
    ) -> Box<dyn TerminalSession>;

    /// Best-effort kill and cleanup of the backing process for `handle`.
    fn interrupt_and_reap(&self, handle: &SessionHandle) -> Result<()>;
}

/// Read-only preference source.
pub trait Preferences: Send + Sync {
    /// New sessions track environment variables across reconnects.
    fn track_environment_by_default(&self) -> bool;

    /// Sessions render a blinking cursor.
    fn blinking_cursor(&self) -> bool;
}

impl Preferences for PreferenceSettings {
    fn track_environment_by_default(&self) -> bool {
        self.track_environment
    }

    fn blinking_cursor(&self) -> bool {
        self.blinking_cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_settings_provider() {
        let prefs = PreferenceSettings {
            track_environment: false,
            blinking_cursor: true,
        };
        let provider: &dyn Preferences = &prefs;
        assert!(!provider.track_environment_by_default());
        assert!(provider.blinking_cursor());
    }
}
