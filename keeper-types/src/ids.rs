//! Identifier types used throughout keeper.
//!
//! `UniqueId` is minted locally and never changes for an installation.
//! `ProjectId` is assigned by the remote authority.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed literal tag every installation identity starts with.
pub const UNIQUE_ID_PREFIX: &str = "PROJ_";

/// Number of hex characters following the prefix.
pub const UNIQUE_ID_HEX_LEN: usize = 16;

/// Stable identity of one installation (`PROJ_` + 16 upper-case hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UniqueId(String);

impl UniqueId {
    /// Builds an identity from a digest, keeping the first 16 hex characters.
    ///
    /// Digests shorter than 8 bytes are zero-padded.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut head = [0u8; UNIQUE_ID_HEX_LEN / 2];
        let n = digest.len().min(head.len());
        head[..n].copy_from_slice(&digest[..n]);
        Self(format!("{UNIQUE_ID_PREFIX}{}", hex::encode_upper(head)))
    }

    /// Parses and validates an identity string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix(UNIQUE_ID_PREFIX)
            .ok_or_else(|| crate::Error::InvalidUniqueId(s.to_string()))?;
        if hex.len() != UNIQUE_ID_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(crate::Error::InvalidUniqueId(s.to_string()));
        }
        Ok(Self(format!("{UNIQUE_ID_PREFIX}{}", hex.to_ascii_uppercase())))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UniqueId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UniqueId {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UniqueId> for String {
    fn from(id: UniqueId) -> Self {
        id.0
    }
}

/// Identifier the remote authority assigned to a project record.
///
/// The authority emits it as a JSON number or a string depending on the
/// endpoint, so both are accepted and normalised to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n.to_string())),
            Raw::Text(s) if !s.trim().is_empty() => Ok(Self(s)),
            Raw::Text(_) => Err(serde::de::Error::custom("empty project id")),
        }
    }
}
