//! Serializable read-only view of the session list.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use term_registry_core::{AutoCloseMode, SessionHandle, SessionMetadata, ShellType};

/// One row of the session list, in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SessionListEntry {
    /// 0-based position in the list
    pub index: usize,
    /// Session handle
    pub handle: SessionHandle,
    /// Display name
    pub caption: String,
    /// Current title
    pub title: String,
    /// Sequence number assigned at creation
    pub sequence: u32,
    /// Session has child processes
    pub busy: bool,
    /// Last known working directory
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub cwd: String,
    /// Terminal width
    pub columns: u16,
    /// Terminal height
    pub rows: u16,
    /// Kind of shell
    pub shell_type: ShellType,
    /// Auto-close policy
    pub auto_close: AutoCloseMode,
    /// Process exited, entry retained
    pub zombie: bool,
}

impl SessionListEntry {
    /// Build a row from a metadata snapshot.
    pub fn new(index: usize, meta: &SessionMetadata) -> Self {
        Self {
            index,
            handle: meta.handle.clone(),
            caption: meta.caption.clone(),
            title: meta.title.clone(),
            sequence: meta.sequence,
            busy: meta.has_child_processes,
            cwd: meta.working_directory.clone(),
            columns: meta.columns,
            rows: meta.rows,
            shell_type: meta.shell_type,
            auto_close: meta.auto_close,
            zombie: meta.zombie,
        }
    }
}

/// Rows for every entry of a registry snapshot.
pub fn entries(snapshot: &[SessionMetadata]) -> Vec<SessionListEntry> {
    snapshot
        .iter()
        .enumerate()
        .map(|(index, meta)| SessionListEntry::new(index, meta))
        .collect()
}

/// Plain-text listing, one session per line.
pub fn render_text(entries: &[SessionListEntry]) -> String {
    if entries.is_empty() {
        return "no sessions".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            let mut line = format!(
                "{:>2}  {}  #{:<3} {:<16} {}",
                entry.index,
                entry.handle,
                entry.sequence,
                entry.caption,
                if entry.busy { "busy" } else { "idle" }
            );
            if !entry.title.is_empty() {
                line.push_str(&format!("  \"{}\"", entry.title));
            }
            if !entry.cwd.is_empty() {
                line.push_str(&format!("  {}", entry.cwd));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON schema of [`SessionListEntry`].
pub fn schema_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&schemars::schema_for!(SessionListEntry))
}
