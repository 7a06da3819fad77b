//! Repository implementations module.
//!
//! - `local`: In-memory implementation for unit testing and local development

#[cfg(feature = "local-repo")]
pub mod local;

#[cfg(feature = "local-repo")]
pub use local::{LocalRepository, Operation};
