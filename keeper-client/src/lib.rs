//! Client side of the keeper remote authority protocol.
//!
//! - [`AuthorityClient`]: JSON-over-HTTPS calls with per-call deadlines
//! - [`Registrar`]: idempotent registration with conflict recovery
//! - [`HeartbeatEmitter`]: bounded, fire-and-forget liveness reporting

mod api;
mod config;
mod error;
mod heartbeat;
mod memory;
mod payload;
mod registration;

pub use api::{Authority, AuthorityClient};
pub use config::{CallClass, ClientConfig, DEFAULT_BASE_URL};
pub use error::{ClientError, ClientResult};
pub use heartbeat::HeartbeatEmitter;
pub use memory::MemorySample;
pub use payload::{
    ActivationCheck, ConfigSnapshot, DATETIME_FORMAT, HeartbeatPayload, LastSeenPayload,
    StoreProjectRequest,
};
pub use registration::{Registrar, Registration, RegistrationPath};
