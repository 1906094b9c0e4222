//! Ordered registry of terminal session metadata.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use term_registry_core::{
    AutoCloseMode, SessionHandle, SessionMetadata, TerminalSettings, SEQUENCE_NO_TERMINAL,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::backend::{Preferences, SessionFactory, StartOptions, TerminalSession};
use crate::busy::{self, BusyChanged, BusyPublisher};
use crate::{caption, sequence};

struct RegistryInner {
    /// Insertion ordered. Re-inserting an existing handle keeps its slot.
    sessions: IndexMap<SessionHandle, SessionMetadata>,
    /// Highest sequence number ever allocated or tracked.
    high_water: u32,
}

impl RegistryInner {
    fn insert(&mut self, metadata: SessionMetadata) {
        self.high_water = self.high_water.max(metadata.sequence);
        self.sessions.insert(metadata.handle.clone(), metadata);
    }
}

/// Insertion-ordered catalog of terminal session metadata.
///
/// The registry is the only writer of the metadata it tracks. Every
/// operation runs under a single lock that also covers sequence allocation
/// and busy publication, so a mutation is never observable without its
/// matching [`BusyChanged`] notification. Clones share the same state.
///
/// Collaborators are called while the lock is held (except
/// [`TerminalSession::connect`]) and must not call back into the registry
/// synchronously.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    busy: BusyPublisher,
    factory: Arc<dyn SessionFactory>,
    preferences: Arc<dyn Preferences>,
    terminal: TerminalSettings,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Create an empty registry with default terminal settings.
    pub fn new(factory: Arc<dyn SessionFactory>, preferences: Arc<dyn Preferences>) -> Self {
        Self::with_settings(factory, preferences, TerminalSettings::default())
    }

    /// Create an empty registry whose new sessions use `terminal` defaults.
    pub fn with_settings(
        factory: Arc<dyn SessionFactory>,
        preferences: Arc<dyn Preferences>,
        terminal: TerminalSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                sessions: IndexMap::new(),
                high_water: SEQUENCE_NO_TERMINAL,
            })),
            busy: BusyPublisher::new(),
            factory,
            preferences,
            terminal,
        }
    }

    /// Subscribe to busy-aggregate publications.
    pub fn subscribe_busy(&self) -> broadcast::Receiver<BusyChanged> {
        self.busy.subscribe()
    }

    // ---- Mutation ----

    /// Insert or replace the entry for `metadata.handle`.
    ///
    /// Replacing keeps the entry's original position. Metadata whose handle
    /// has not been assigned is ignored.
    pub fn add(&self, metadata: SessionMetadata) {
        if !metadata.handle.is_assigned() {
            warn!(
                "Ignoring metadata without a handle (caption='{}', sequence={})",
                metadata.caption, metadata.sequence
            );
            return;
        }

        let mut inner = self.inner.lock();
        debug!("Tracking session {} ('{}')", metadata.handle, metadata.caption);
        inner.insert(metadata);
        self.publish_busy(&inner);
    }

    /// Add the metadata reported by a live session object.
    pub fn add_from_session(&self, session: &dyn TerminalSession) {
        self.add(session.metadata());
    }

    /// Delete the entry for `handle`, returning whether one existed.
    ///
    /// The busy aggregate is republished either way.
    pub fn remove(&self, handle: &SessionHandle) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.sessions.shift_remove(handle).is_some();
        if removed {
            debug!("Removed session {}", handle);
        }
        self.publish_busy(&inner);
        removed
    }

    /// Reap every tracked backing process, then clear the registry.
    ///
    /// Reap failures are logged and do not stop the loop; local state is
    /// always cleared. Returns the number of reap requests issued.
    pub fn terminate_all(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.sessions.len();

        for handle in inner.sessions.keys() {
            if let Err(e) = self.factory.interrupt_and_reap(handle) {
                warn!("Failed to reap session {}: {}", handle, e);
            }
        }

        inner.sessions.clear();
        self.publish_busy(&inner);
        info!("Terminated {} session(s)", count);
        count
    }

    /// Change an entry's title. Returns true only if the title changed.
    pub fn retitle(&self, handle: &SessionHandle, title: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.sessions.get_mut(handle) {
            Some(meta) if meta.title != title => {
                meta.title = title.to_string();
                true
            }
            _ => false,
        }
    }

    /// Fold a subprocess-presence notification into the registry.
    ///
    /// Republishes the aggregate whenever `handle` is tracked, even if the
    /// flag did not change. Returns whether `handle` is tracked.
    pub(crate) fn set_child_processes(&self, handle: &SessionHandle, value: bool) -> bool {
        let mut inner = self.inner.lock();
        let Some(meta) = inner.sessions.get_mut(handle) else {
            return false;
        };
        meta.has_child_processes = value;
        self.publish_busy(&inner);
        true
    }

    /// Fold a working-directory notification into the registry.
    ///
    /// Returns whether the stored directory changed.
    pub(crate) fn set_working_directory(&self, handle: &SessionHandle, cwd: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.sessions.get_mut(handle) {
            Some(meta) if meta.working_directory != cwd => {
                meta.working_directory = cwd.to_string();
                true
            }
            _ => false,
        }
    }

    // ---- Creation ----

    /// Start a new session with the first free default caption.
    ///
    /// Returns the handle the session layer assigned, or `None` once
    /// sequence numbers are exhausted.
    pub fn create_new(&self) -> Option<SessionHandle> {
        let session = {
            let mut inner = self.inner.lock();
            let sequence = self.allocate_sequence(&mut inner)?;
            let Some(caption) = caption::free_default_caption(inner.sessions.values(), sequence)
            else {
                warn!("No free default caption at or above sequence {}", sequence);
                return None;
            };
            let metadata = self.fresh_metadata(SessionMetadata::new_named_terminal(
                sequence,
                caption,
                self.preferences.track_environment_by_default(),
            ));
            self.start_locked(&mut inner, metadata, true)
        };
        Some(Self::connect_session(session))
    }

    /// Start a new session with the given caption.
    ///
    /// An empty caption behaves like [`create_new`](Self::create_new). Returns
    /// `None` without touching the registry if the caption is already taken
    /// or sequence numbers are exhausted.
    pub fn create_named(&self, caption: &str) -> Option<SessionHandle> {
        if caption.is_empty() {
            return self.create_new();
        }

        let session = {
            let mut inner = self.inner.lock();
            if !caption::is_caption_available(inner.sessions.values(), caption) {
                debug!("Caption '{}' is already in use", caption);
                return None;
            }
            let sequence = self.allocate_sequence(&mut inner)?;
            let metadata = self.fresh_metadata(SessionMetadata::new_named_terminal(
                sequence,
                caption,
                self.preferences.track_environment_by_default(),
            ));
            self.start_locked(&mut inner, metadata, true)
        };
        Some(Self::connect_session(session))
    }

    /// Restart a known session from its stored metadata.
    ///
    /// The session layer either resumes the live process or relaunches one
    /// from the saved description. Returns false for an unknown handle.
    pub fn reconnect(&self, handle: &SessionHandle) -> bool {
        let session = {
            let mut inner = self.inner.lock();
            let metadata = match inner.sessions.get_mut(handle) {
                Some(existing) => {
                    existing.handle = handle.clone();
                    existing.clone()
                }
                None => {
                    debug!("Cannot reconnect unknown session {}", handle);
                    return false;
                }
            };
            info!("Reconnecting session {} ('{}')", handle, metadata.caption);
            self.start_locked(&mut inner, metadata, false)
        };
        Self::connect_session(session);
        true
    }

    /// Next sequence number that creation would allocate, or `None` once
    /// `u32::MAX` has been used.
    pub fn next_sequence(&self) -> Option<u32> {
        let inner = self.inner.lock();
        sequence::next_sequence(inner.sessions.values(), inner.high_water)
    }

    fn allocate_sequence(&self, inner: &mut RegistryInner) -> Option<u32> {
        let Some(sequence) = sequence::next_sequence(inner.sessions.values(), inner.high_water)
        else {
            warn!("Sequence numbers exhausted, refusing to create a session");
            return None;
        };
        inner.high_water = sequence;
        Some(sequence)
    }

    fn fresh_metadata(&self, metadata: SessionMetadata) -> SessionMetadata {
        metadata
            .with_dimensions(self.terminal.dimensions())
            .with_shell_type(self.terminal.default_shell)
    }

    /// Materialize a session, record it if new, and republish.
    fn start_locked(
        &self,
        inner: &mut RegistryInner,
        metadata: SessionMetadata,
        is_new: bool,
    ) -> Box<dyn TerminalSession> {
        let options = StartOptions {
            blinking_cursor: self.preferences.blinking_cursor(),
            focus: true,
        };
        let session = self.factory.create_session(&metadata, options);

        if is_new {
            Self::record_new(inner, session.metadata());
        }

        self.publish_busy(inner);
        session
    }

    fn record_new(inner: &mut RegistryInner, mut metadata: SessionMetadata) {
        if !metadata.handle.is_assigned() {
            warn!(
                "Session layer assigned no handle to sequence {}; not tracking it",
                metadata.sequence
            );
            return;
        }

        if metadata.caption.is_empty()
            || !caption::is_caption_available(inner.sessions.values(), &metadata.caption)
        {
            let Some(fallback) =
                caption::free_default_caption(inner.sessions.values(), metadata.sequence)
            else {
                warn!(
                    "No free caption for session {} (sequence {}); not tracking it",
                    metadata.handle, metadata.sequence
                );
                return;
            };
            if !metadata.caption.is_empty() {
                warn!(
                    "Caption '{}' already in use, naming session {} '{}'",
                    metadata.caption, metadata.handle, fallback
                );
            }
            metadata.caption = fallback;
        }

        info!(
            "Created session {} ('{}', sequence={})",
            metadata.handle, metadata.caption, metadata.sequence
        );
        inner.insert(metadata);
    }

    fn connect_session(mut session: Box<dyn TerminalSession>) -> SessionHandle {
        let handle = session.handle();
        if let Err(e) = session.connect() {
            warn!("Session {} failed to connect: {}", handle, e);
        }
        handle
    }

    fn publish_busy(&self, inner: &RegistryInner) {
        self.busy.publish(busy::any_busy(inner.sessions.values()));
    }

    // ---- Queries ----

    /// Number of tracked sessions.
    pub fn count(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    /// Whether no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// 0-based position of `handle` in iteration order.
    pub fn index_of(&self, handle: &SessionHandle) -> Option<usize> {
        self.inner.lock().sessions.get_index_of(handle)
    }

    /// Handle at 0-based position `index`.
    pub fn handle_at(&self, index: usize) -> Option<SessionHandle> {
        self.inner
            .lock()
            .sessions
            .get_index(index)
            .map(|(handle, _)| handle.clone())
    }

    /// All tracked handles in insertion order.
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.inner.lock().sessions.keys().cloned().collect()
    }

    /// Read-only copy of one entry.
    pub fn metadata(&self, handle: &SessionHandle) -> Option<SessionMetadata> {
        self.inner.lock().sessions.get(handle).cloned()
    }

    /// Read-only copy of every entry in insertion order.
    pub fn snapshot(&self) -> Vec<SessionMetadata> {
        self.inner.lock().sessions.values().cloned().collect()
    }

    /// True iff no tracked session uses `caption`.
    pub fn is_caption_available(&self, caption: &str) -> bool {
        caption::is_caption_available(self.inner.lock().sessions.values(), caption)
    }

    /// First handle, in iteration order, whose caption is `caption`.
    pub fn handle_for_caption(&self, caption: &str) -> Option<SessionHandle> {
        caption::handle_for_caption(self.inner.lock().sessions.values(), caption).cloned()
    }

    /// Auto-close policy of `handle`, or [`AutoCloseMode::Default`] if unknown.
    pub fn auto_close_mode(&self, handle: &SessionHandle) -> AutoCloseMode {
        self.inner
            .lock()
            .sessions
            .get(handle)
            .map(|meta| meta.auto_close)
            .unwrap_or_default()
    }

    /// Caption of `handle`.
    pub fn caption_of(&self, handle: &SessionHandle) -> Option<String> {
        self.inner
            .lock()
            .sessions
            .get(handle)
            .map(|meta| meta.caption.clone())
    }

    /// Whether `handle` has child processes.
    ///
    /// Unknown handles report `true`: callers should not assume an unknown
    /// session is safe to dismiss.
    pub fn has_subprocesses(&self, handle: &SessionHandle) -> bool {
        self.inner
            .lock()
            .sessions
            .get(handle)
            .map_or(true, |meta| meta.has_child_processes)
    }

    /// True iff any tracked session has child processes.
    pub fn any_has_subprocesses(&self) -> bool {
        busy::any_busy(self.inner.lock().sessions.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{metadata, RecordingFactory};
    use term_registry_core::{default_caption, Dimensions, PreferenceSettings, ShellType};
    use tokio::sync::broadcast::error::TryRecvError;

    fn registry_with(factory: &RecordingFactory) -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(factory.clone()),
            Arc::new(PreferenceSettings::default()),
        )
    }

    fn drain(rx: &mut broadcast::Receiver<BusyChanged>) -> Vec<bool> {
        let mut seen = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => seen.push(event.busy),
                Err(TryRecvError::Empty) => return seen,
                Err(e) => panic!("unexpected receive error: {e:?}"),
            }
        }
    }

    fn h(handle: &str) -> SessionHandle {
        SessionHandle::new(handle)
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = registry_with(&RecordingFactory::new());
        assert_eq!(registry.count(), 0);
        assert!(registry.is_empty());
        assert!(!registry.any_has_subprocesses());
        assert_eq!(registry.next_sequence(), Some(1));
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("c", "three", 3));
        registry.add(metadata("a", "one", 1));
        registry.add(metadata("b", "two", 2));

        assert_eq!(registry.handles(), vec![h("c"), h("a"), h("b")]);
        assert_eq!(registry.index_of(&h("a")), Some(1));
        assert_eq!(registry.handle_at(2), Some(h("b")));
    }

    #[test]
    fn test_add_existing_handle_replaces_in_place() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("a", "one", 1));
        registry.add(metadata("b", "two", 2));

        let mut updated = metadata("a", "renamed", 1);
        updated.title = "vim".to_string();
        registry.add(updated);

        assert_eq!(registry.count(), 2);
        assert_eq!(registry.index_of(&h("a")), Some(0));
        assert_eq!(registry.caption_of(&h("a")).as_deref(), Some("renamed"));
        assert!(registry.is_caption_available("one"));
    }

    #[test]
    fn test_add_publishes_busy() {
        let registry = registry_with(&RecordingFactory::new());
        let mut rx = registry.subscribe_busy();

        let mut busy = metadata("a", "one", 1);
        busy.has_child_processes = true;
        registry.add(busy);
        registry.add(metadata("b", "two", 2));

        assert_eq!(drain(&mut rx), vec![true, true]);
        assert!(registry.any_has_subprocesses());
    }

    #[test]
    fn test_add_without_handle_is_ignored() {
        let registry = registry_with(&RecordingFactory::new());
        let mut rx = registry.subscribe_busy();

        registry.add(SessionMetadata::new_terminal(1, false));

        assert_eq!(registry.count(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_add_from_session() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        let session = factory.create_session(
            &SessionMetadata::new_terminal(4, true),
            StartOptions {
                blinking_cursor: false,
                focus: false,
            },
        );

        registry.add_from_session(session.as_ref());

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.caption_of(&session.handle()).as_deref(), Some("Terminal 4"));
        assert_eq!(registry.next_sequence(), Some(5));
    }

    #[test]
    fn test_remove() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("a", "one", 1));
        registry.add(metadata("b", "two", 2));
        registry.add(metadata("c", "three", 3));

        assert!(registry.remove(&h("b")));
        assert_eq!(registry.handles(), vec![h("a"), h("c")]);
        assert_eq!(registry.index_of(&h("c")), Some(1));
    }

    #[test]
    fn test_remove_unknown_is_noop_but_publishes() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("a", "one", 1));
        let mut rx = registry.subscribe_busy();

        assert!(!registry.remove(&h("ghost")));
        assert_eq!(registry.count(), 1);
        assert_eq!(drain(&mut rx), vec![false]);
    }

    #[test]
    fn test_remove_last_busy_clears_aggregate() {
        let registry = registry_with(&RecordingFactory::new());
        let mut busy = metadata("a", "one", 1);
        busy.has_child_processes = true;
        registry.add(busy);
        let mut rx = registry.subscribe_busy();

        registry.remove(&h("a"));

        assert!(!registry.any_has_subprocesses());
        assert_eq!(drain(&mut rx), vec![false]);
    }

    #[test]
    fn test_index_sentinels() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("a", "one", 1));

        assert_eq!(registry.index_of(&h("missing")), None);
        assert_eq!(registry.handle_at(1), None);
        assert_eq!(registry.handle_at(usize::MAX), None);
    }

    #[test]
    fn test_caption_queries() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("a", "build", 1));
        registry.add(metadata("b", "logs", 2));

        assert!(!registry.is_caption_available("build"));
        assert!(registry.is_caption_available("Build"));
        assert_eq!(registry.handle_for_caption("logs"), Some(h("b")));
        assert_eq!(registry.handle_for_caption("nope"), None);
    }

    #[test]
    fn test_retitle() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("a", "one", 1));

        assert!(registry.retitle(&h("a"), "top"));
        assert!(!registry.retitle(&h("a"), "top"));
        assert!(!registry.retitle(&h("ghost"), "top"));
        assert_eq!(registry.metadata(&h("a")).unwrap().title, "top");
    }

    #[test]
    fn test_accessor_defaults_for_unknown_handle() {
        let registry = registry_with(&RecordingFactory::new());
        let ghost = h("ghost");

        assert_eq!(registry.auto_close_mode(&ghost), AutoCloseMode::Default);
        assert_eq!(registry.caption_of(&ghost), None);
        assert!(registry.has_subprocesses(&ghost));
        assert!(registry.metadata(&ghost).is_none());
    }

    #[test]
    fn test_accessors_for_known_handle() {
        let registry = registry_with(&RecordingFactory::new());
        let mut meta = metadata("a", "one", 1);
        meta.auto_close = AutoCloseMode::Never;
        registry.add(meta);

        assert_eq!(registry.auto_close_mode(&h("a")), AutoCloseMode::Never);
        assert!(!registry.has_subprocesses(&h("a")));
    }

    #[test]
    fn test_create_new() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        let mut rx = registry.subscribe_busy();

        let handle = registry.create_new().unwrap();

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.caption_of(&handle).as_deref(), Some("Terminal 1"));
        assert_eq!(drain(&mut rx), vec![false]);

        let log = factory.log();
        assert_eq!(log.started.len(), 1);
        let (requested, options) = &log.started[0];
        assert!(!requested.handle.is_assigned());
        assert_eq!(requested.caption, "Terminal 1");
        assert_eq!(requested.sequence, 1);
        assert!(requested.track_environment);
        assert!(options.blinking_cursor);
        assert!(options.focus);
        assert_eq!(log.connected, vec![handle]);
    }

    #[test]
    fn test_create_new_uses_terminal_settings() {
        let factory = RecordingFactory::new();
        let registry = SessionRegistry::with_settings(
            Arc::new(factory.clone()),
            Arc::new(PreferenceSettings {
                track_environment: false,
                blinking_cursor: false,
            }),
            TerminalSettings {
                default_rows: 40,
                default_cols: 132,
                default_shell: ShellType::PosixBash,
            },
        );

        let handle = registry.create_new().unwrap();

        let meta = registry.metadata(&handle).unwrap();
        assert_eq!(meta.dimensions(), Dimensions::new(40, 132));
        assert_eq!(meta.shell_type, ShellType::PosixBash);
        assert!(!meta.track_environment);
        assert!(!factory.log().started[0].1.blinking_cursor);
    }

    #[test]
    fn test_create_new_sequences_increase() {
        let registry = registry_with(&RecordingFactory::new());
        let first = registry.create_new().unwrap();
        let second = registry.create_new().unwrap();

        assert_eq!(registry.metadata(&first).unwrap().sequence, 1);
        assert_eq!(registry.metadata(&second).unwrap().sequence, 2);
        assert_eq!(registry.caption_of(&second).as_deref(), Some("Terminal 2"));
    }

    #[test]
    fn test_create_new_avoids_taken_default_caption() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        registry.create_named("Terminal 2").unwrap();

        let handle = registry.create_new().unwrap();

        assert_eq!(registry.caption_of(&handle).as_deref(), Some("Terminal 3"));
        // The session layer is handed the resolved caption up front.
        let log = factory.log();
        assert_eq!(log.started[1].0.sequence, 2);
        assert_eq!(log.started[1].0.caption, "Terminal 3");
    }

    #[test]
    fn test_creation_refused_once_sequences_exhausted() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        registry.add(metadata("max", &default_caption(u32::MAX), u32::MAX));
        let mut rx = registry.subscribe_busy();

        assert_eq!(registry.next_sequence(), None);
        assert_eq!(registry.create_new(), None);
        assert_eq!(registry.create_named("fresh"), None);
        assert_eq!(registry.create_named(""), None);

        assert_eq!(registry.count(), 1);
        assert!(factory.log().started.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_last_sequence_is_usable_once() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("near", "near", u32::MAX - 1));

        let last = registry.create_new().unwrap();
        assert_eq!(registry.metadata(&last).unwrap().sequence, u32::MAX);
        assert_eq!(registry.caption_of(&last), Some(default_caption(u32::MAX)));

        assert_eq!(registry.create_new(), None);
        let captions: Vec<String> = registry.snapshot().into_iter().map(|m| m.caption).collect();
        assert_eq!(captions, vec!["near".to_string(), default_caption(u32::MAX)]);
    }

    #[test]
    fn test_create_named() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);

        let handle = registry.create_named("shell-1").expect("caption is free");

        assert!(!registry.is_caption_available("shell-1"));
        assert_eq!(registry.handle_for_caption("shell-1"), Some(handle));
        assert_eq!(factory.log().started[0].0.caption, "shell-1");
    }

    #[test]
    fn test_create_named_duplicate_fails_without_mutation() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        registry.create_named("shell-1").unwrap();
        let mut rx = registry.subscribe_busy();

        assert_eq!(registry.create_named("shell-1"), None);

        assert_eq!(registry.count(), 1);
        assert_eq!(factory.log().started.len(), 1);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(registry.next_sequence(), Some(2));
    }

    #[test]
    fn test_create_named_empty_behaves_like_create_new() {
        let registry = registry_with(&RecordingFactory::new());

        let handle = registry.create_named("").expect("empty caption always succeeds");

        assert_eq!(registry.caption_of(&handle).as_deref(), Some("Terminal 1"));
    }

    #[test]
    fn test_connect_failure_does_not_fail_creation() {
        let factory = RecordingFactory::new().fail_connects();
        let registry = registry_with(&factory);

        let handle = registry.create_named("flaky");

        assert!(handle.is_some());
        assert_eq!(registry.count(), 1);
        assert_eq!(factory.log().connected.len(), 1);
    }

    #[test]
    fn test_sequence_gaps_are_not_reused() {
        let registry = registry_with(&RecordingFactory::new());
        registry.add(metadata("a", "one", 1));
        registry.add(metadata("b", "two", 2));
        registry.add(metadata("e", "five", 5));
        assert_eq!(registry.next_sequence(), Some(6));

        registry.remove(&h("e"));
        assert_eq!(registry.next_sequence(), Some(6));

        let handle = registry.create_new().unwrap();
        assert_eq!(registry.metadata(&handle).unwrap().sequence, 6);
        assert_eq!(registry.next_sequence(), Some(7));
    }

    #[test]
    fn test_reconnect_unknown() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        registry.add(metadata("a", "one", 1));
        let mut rx = registry.subscribe_busy();

        assert!(!registry.reconnect(&h("unknown-handle")));

        assert_eq!(registry.count(), 1);
        assert!(factory.log().started.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_reconnect_known() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        let mut stored = metadata("a", "one", 1);
        stored.working_directory = "/tmp".to_string();
        registry.add(stored.clone());
        registry.add(metadata("b", "two", 2));
        let mut rx = registry.subscribe_busy();

        assert!(registry.reconnect(&h("a")));

        assert_eq!(drain(&mut rx), vec![false]);
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.index_of(&h("a")), Some(0));

        let log = factory.log();
        assert_eq!(log.started.len(), 1);
        assert_eq!(log.started[0].0, stored);
        assert_eq!(log.connected, vec![h("a")]);
    }

    #[test]
    fn test_terminate_all() {
        let factory = RecordingFactory::new();
        let registry = registry_with(&factory);
        let mut busy = metadata("a", "one", 1);
        busy.has_child_processes = true;
        registry.add(busy);
        registry.add(metadata("b", "two", 2));
        registry.add(metadata("c", "three", 3));
        let mut rx = registry.subscribe_busy();

        assert_eq!(registry.terminate_all(), 3);

        assert_eq!(registry.count(), 0);
        assert_eq!(factory.log().reaped, vec![h("a"), h("b"), h("c")]);
        assert_eq!(drain(&mut rx), vec![false]);
    }

    #[test]
    fn test_terminate_all_with_failing_reaps() {
        let factory = RecordingFactory::new().fail_reaps();
        let registry = registry_with(&factory);
        registry.add(metadata("a", "one", 1));
        registry.add(metadata("b", "two", 2));

        assert_eq!(registry.terminate_all(), 2);

        assert!(registry.is_empty());
        assert_eq!(factory.log().reaped.len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = registry_with(&RecordingFactory::new());
        let other = registry.clone();

        other.add(metadata("a", "one", 1));

        assert_eq!(registry.count(), 1);
    }
}
