//! Core type definitions for keeper.
//!
//! This crate defines the plain data shared by every other keeper crate:
//! - Installation identity (`UniqueId`) and remote project ids
//! - The in-memory credential pair and remote project records
//! - The per-request context and the system-info snapshot built from it
//!
//! Nothing here performs I/O.

mod context;
mod ids;
mod project;

pub use context::{AppDescriptor, RequestContext, ServerInfo, SystemInfo};
pub use ids::{ProjectId, UniqueId, UNIQUE_ID_HEX_LEN, UNIQUE_ID_PREFIX};
pub use project::{DataEnvelope, ProjectCredentials, ProjectInfo, ProjectStatus, deserialize_flag};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid unique id: {0:?}")]
    InvalidUniqueId(String),
}
