//! Aggregate "any session busy" state and its publication.

use term_registry_core::SessionMetadata;
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the busy-changed channel.
///
/// Subscribers that fall further behind than this see `Lagged` and should
/// re-read [`crate::SessionRegistry::any_has_subprocesses`].
const BUSY_CHANNEL_CAPACITY: usize = 64;

/// Published after every mutation that could affect the busy aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyChanged {
    /// True iff at least one tracked session has child processes
    pub busy: bool,
}

/// True iff any entry reports child processes.
pub fn any_busy<'a, I>(entries: I) -> bool
where
    I: IntoIterator<Item = &'a SessionMetadata>,
{
    entries.into_iter().any(|meta| meta.has_child_processes)
}

/// Broadcast sender for [`BusyChanged`] notifications.
///
/// Publishing is idempotent: the same value may be sent repeatedly and
/// sending with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct BusyPublisher {
    tx: broadcast::Sender<BusyChanged>,
}

impl BusyPublisher {
    /// Create a publisher with the default channel capacity.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUSY_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish the current aggregate.
    pub fn publish(&self, busy: bool) {
        // No receivers is fine.
        let receivers = self.tx.send(BusyChanged { busy }).unwrap_or(0);
        debug!("Published busy={} to {} subscriber(s)", busy, receivers);
    }

    /// Subscribe to future publications.
    pub fn subscribe(&self) -> broadcast::Receiver<BusyChanged> {
        self.tx.subscribe()
    }
}

impl Default for BusyPublisher {
    fn default() -> Self {
        Self::new()
    }
}
