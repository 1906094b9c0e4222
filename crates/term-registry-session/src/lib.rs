//! # term-registry-session
//!
//! Session registry for terminal sessions.
//!
//! This crate provides:
//! - An insertion-ordered registry of session metadata
//! - Sequence number allocation and caption uniqueness checks
//! - The "any session busy" aggregate and its publication
//! - Ingestion of subprocess and working-directory notifications
//! - Collaborator traits for the session layer and preferences
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on term-registry-core
//! and drives the external session layer through the traits in [`backend`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod busy;
pub mod caption;
pub mod ingest;
pub mod registry;
pub mod sequence;
pub mod testing;

// Re-export commonly used types
pub use backend::{Preferences, SessionFactory, StartOptions, TerminalSession};
pub use busy::{BusyChanged, BusyPublisher};
pub use ingest::{EventIngestion, SessionEvent};
pub use registry::SessionRegistry;
