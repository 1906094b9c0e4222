//! Terminal Session Registry Console Library
//!
//! This library contains the pieces the `term-registry` binary wires
//! together: a bookkeeping session layer, the console command set, and the
//! serializable list view. The binary itself is in main.rs.

pub mod console;
pub mod local;
pub mod view;

// Re-export commonly used types
pub use console::{Command, Console, Reply};
pub use local::LocalSessionFactory;
pub use view::SessionListEntry;
