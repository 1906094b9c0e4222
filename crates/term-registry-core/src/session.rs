//! Session metadata types for the terminal session registry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Dimensions;

/// Sequence value meaning "no terminal". Allocation starts one above it.
pub const SEQUENCE_NO_TERMINAL: u32 = 0;

/// Opaque identifier assigned to a session by the backing process layer.
///
/// Freshly built metadata carries an unassigned (empty) handle until the
/// session layer materializes the session.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Wrap a handle string issued by the session layer.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The unassigned handle.
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// Whether the session layer has assigned this handle.
    pub fn is_assigned(&self) -> bool {
        !self.0.is_empty()
    }

    /// Get the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionHandle {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

impl From<String> for SessionHandle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of shell backing a session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ShellType {
    /// Platform default shell
    #[default]
    Default,
    /// Git for Windows bash
    GitBash,
    /// Windows Subsystem for Linux bash
    WslBash,
    /// 32-bit cmd.exe
    Cmd32,
    /// 64-bit cmd.exe
    Cmd64,
    /// 32-bit PowerShell
    PowerShell32,
    /// 64-bit PowerShell
    PowerShell64,
    /// bash on a POSIX system
    PosixBash,
    /// zsh on a POSIX system
    PosixZsh,
    /// User-supplied shell executable
    Custom,
}

/// Whether a session's tab closes when its process exits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AutoCloseMode {
    /// Follow the user's global preference
    #[default]
    Default,
    /// Always close on exit
    Always,
    /// Never close on exit; the session becomes a zombie
    Never,
}

/// Default caption for a session created without an explicit name.
pub fn default_caption(sequence: u32) -> String {
    format!("Terminal {sequence}")
}

/// Metadata describing one terminal session.
///
/// Enough to redisplay the session in a list and to reconnect to its
/// backing process after the registry's owner restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SessionMetadata {
    /// Primary key assigned by the backing process layer
    pub handle: SessionHandle,
    /// Unique display name
    pub caption: String,
    /// Freeform current title (e.g. running command)
    pub title: String,
    /// Display-order hint, assigned once at creation
    pub sequence: u32,
    /// Session currently has child processes ("busy")
    pub has_child_processes: bool,
    /// Terminal width at last known state
    pub columns: u16,
    /// Terminal height at last known state
    pub rows: u16,
    /// Kind of shell backing the session
    pub shell_type: ShellType,
    /// Alternate screen buffer was active at last known state
    pub alt_buffer_active: bool,
    /// Last known working directory
    pub working_directory: String,
    /// Auto-close policy
    pub auto_close: AutoCloseMode,
    /// Process exited but the entry is kept for inspection
    pub zombie: bool,
    /// Environment variables are persisted across reconnects
    pub track_environment: bool,
}

impl SessionMetadata {
    /// Metadata for a new session that the session layer will name.
    pub fn new_terminal(sequence: u32, track_environment: bool) -> Self {
        let dims = Dimensions::default();
        Self {
            handle: SessionHandle::unassigned(),
            caption: String::new(),
            title: String::new(),
            sequence,
            has_child_processes: false,
            columns: dims.cols,
            rows: dims.rows,
            shell_type: ShellType::Default,
            alt_buffer_active: false,
            working_directory: String::new(),
            auto_close: AutoCloseMode::Default,
            zombie: false,
            track_environment,
        }
    }

    /// Metadata for a new session carrying a caller-chosen caption.
    pub fn new_named_terminal(
        sequence: u32,
        caption: impl Into<String>,
        track_environment: bool,
    ) -> Self {
        Self {
            caption: caption.into(),
            ..Self::new_terminal(sequence, track_environment)
        }
    }

    /// Set the initial terminal dimensions.
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.columns = dimensions.cols;
        self.rows = dimensions.rows;
        self
    }

    /// Set the shell kind.
    pub fn with_shell_type(mut self, shell_type: ShellType) -> Self {
        self.shell_type = shell_type;
        self
    }

    /// Terminal dimensions at last known state.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.rows, self.columns)
    }
}
