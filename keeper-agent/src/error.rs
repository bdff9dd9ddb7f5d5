//! Agent construction errors.

use keeper_client::ClientError;
use keeper_identity::IdentityError;
use thiserror::Error;

pub type AgentResult<T> = Result<T, AgentError>;

/// Errors raised while setting the agent up. Once running, the agent does not fail.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("authority client: {0}")]
    Client(#[from] ClientError),

    #[error("project is not registered")]
    NotRegistered,
}
