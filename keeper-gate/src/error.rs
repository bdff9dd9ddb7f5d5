//! Gate error types.

use keeper_client::ClientError;
use thiserror::Error;

/// Result type for gate lookups.
pub type GateResult<T> = Result<T, GateError>;

/// Failures inside the gate. None of these reach the host.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("authority error: {0}")]
    Authority(#[from] ClientError),

    #[error("no project registered for {0}")]
    NotFound(String),

    #[error("authority did not answer within {0} ms")]
    Timeout(u64),
}
