//! Error types for the terminal session registry.
//!
//! Registry operations themselves report expected failures (taken caption,
//! unknown handle) through `bool`/`Option` outcomes. This enum covers the
//! collaborator and configuration failures around them.

use thiserror::Error;

use crate::SessionHandle;

/// Main error type for term-registry operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The session layer failed to interrupt and reap a backing process
    #[error("Failed to reap session {handle}: {reason}")]
    Reap {
        /// Handle of the process that could not be reaped
        handle: SessionHandle,
        /// Collaborator-supplied reason
        reason: String,
    },

    /// A started session failed to connect to its backing process
    #[error("Failed to connect session {handle}: {reason}")]
    Connect {
        /// Handle of the session that failed to connect
        handle: SessionHandle,
        /// Collaborator-supplied reason
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
