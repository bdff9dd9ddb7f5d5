//! Error types for the identity store.

use thiserror::Error;

/// Identity-specific errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The deterministic strategy was chosen without local secret material.
    #[error("deterministic identity requires an application secret")]
    MissingSecret,

    /// The stored artifact exists but could not be decoded.
    #[error("corrupt identity artifact: {0}")]
    Corrupt(String),

    /// Token obfuscation failed.
    #[error("identity token encryption failed: {0}")]
    Encryption(String),

    /// Token could not be decrypted (wrong key or tampered data).
    #[error("identity token decryption failed: {0}")]
    Decryption(String),

    /// Filesystem error.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Identity string failed validation.
    #[error("invalid identity: {0}")]
    Invalid(#[from] keeper_types::Error),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
