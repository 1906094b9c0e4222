//! # term-registry-core
//!
//! Core types for the terminal session registry.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other term-registry crates. It provides:
//!
//! - Session types (SessionHandle, SessionMetadata, ShellType, AutoCloseMode)
//! - Geometry types (Dimensions)
//! - Configuration types (RegistryConfig and its sections)
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other term-registry crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod session;

// Re-export commonly used types
pub use config::{LoggingSettings, PreferenceSettings, RegistryConfig, TerminalSettings};
pub use error::{Error, Result};
pub use geometry::Dimensions;
pub use session::{
    default_caption, AutoCloseMode, SessionHandle, SessionMetadata, ShellType,
    SEQUENCE_NO_TERMINAL,
};
