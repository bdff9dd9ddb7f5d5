//! Identity derivation strategies.
//!
//! Two heuristics exist for minting an installation identity and they differ
//! in whether the identity survives a reinstall. Neither is assumed: the
//! operator picks one explicitly.

use crate::error::{IdentityError, IdentityResult};
use keeper_types::UniqueId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Local secret material (typically the host application's secret key).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AppSecret(String);

impl AppSecret {
    /// Wraps a secret. Blank values are rejected.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppSecret([REDACTED])")
    }
}

/// Inputs every strategy may draw on.
#[derive(Debug, Clone)]
pub struct IdentitySeed {
    /// Installation root of the host application.
    pub project_root: PathBuf,
    /// Host application name.
    pub app_name: String,
    /// Per-installation secret, if the host has one.
    pub app_secret: Option<AppSecret>,
}

/// How a fresh identity is minted when no artifact exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    /// `sha256(root || name || secret)`: reproducible on the same machine,
    /// and stable across artifact loss. Requires an application secret.
    Deterministic,
    /// `sha256(root || name || time || random)`: never reproducible.
    ///
    /// Known weakness: losing the artifact mints a new identity, which the
    /// authority will see as a different installation.
    Random,
}

impl IdentityStrategy {
    /// Checks that the seed carries what this strategy needs.
    pub fn validate(&self, seed: &IdentitySeed) -> IdentityResult<()> {
        match self {
            Self::Deterministic if seed.app_secret.is_none() => Err(IdentityError::MissingSecret),
            _ => Ok(()),
        }
    }

    /// Derives a candidate identity from the seed.
    pub fn derive(&self, seed: &IdentitySeed) -> IdentityResult<UniqueId> {
        let mut hasher = Sha256::new();
        hasher.update(seed.project_root.to_string_lossy().as_bytes());
        hasher.update(seed.app_name.as_bytes());

        match self {
            Self::Deterministic => {
                let secret = seed.app_secret.as_ref().ok_or(IdentityError::MissingSecret)?;
                hasher.update(secret.expose().as_bytes());
            }
            Self::Random => {
                hasher.update(chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
                hasher.update(uuid::Uuid::new_v4().as_bytes());
            }
        }

        Ok(UniqueId::from_digest(&hasher.finalize()))
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deterministic => f.write_str("deterministic"),
            Self::Random => f.write_str("random"),
        }
    }
}

impl FromStr for IdentityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deterministic" => Ok(Self::Deterministic),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown identity strategy: {other}")),
        }
    }
}
