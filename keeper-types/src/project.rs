//! Project records owned by the remote authority.

use crate::ids::ProjectId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Reads a flag the authority may send as a bool, `0`/`1`, or a string.
///
/// Any non-zero number is true. Strings must be `0`, `1`, `true` or `false`.
pub fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Number(n) => Ok(n != 0),
        Raw::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag: {other:?}"))),
        },
    }
}

/// The `(project_id, activation_code)` pair held in memory after registration.
///
/// Both halves exist together or the pair does not exist at all, so no
/// remote mutation can be issued with only one of them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCredentials {
    project_id: ProjectId,
    activation_code: String,
}

impl ProjectCredentials {
    /// Pairs an id with its activation code. Returns `None` if the code is blank.
    #[must_use]
    pub fn new(project_id: ProjectId, activation_code: impl Into<String>) -> Option<Self> {
        let activation_code = activation_code.into();
        if activation_code.trim().is_empty() {
            return None;
        }
        Some(Self {
            project_id,
            activation_code,
        })
    }

    /// Builds credentials from optional halves, as returned by the authority.
    #[must_use]
    pub fn from_parts(project_id: Option<ProjectId>, activation_code: Option<String>) -> Option<Self> {
        Self::new(project_id?, activation_code?)
    }

    /// Returns the remote project id.
    #[must_use]
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the activation code.
    #[must_use]
    pub fn activation_code(&self) -> &str {
        &self.activation_code
    }

    /// Replaces the activation code after the authority rotated it.
    pub fn rotate_code(&mut self, activation_code: impl Into<String>) {
        let code = activation_code.into();
        if !code.trim().is_empty() {
            self.activation_code = code;
        }
    }
}

impl fmt::Debug for ProjectCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectCredentials")
            .field("project_id", &self.project_id)
            .field("activation_code", &"[REDACTED]")
            .finish()
    }
}

/// Project details returned by `GET /project/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Remote project id.
    pub id: ProjectId,
    /// Secret required to reactivate the project.
    #[serde(default)]
    pub activation_code: Option<String>,
    /// Whether the project may serve traffic.
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_active: bool,
    /// Human-readable reason shown on the block page.
    #[serde(default)]
    pub suspended_reason: Option<String>,
    /// Display name of the project.
    #[serde(default)]
    pub project_name: Option<String>,
    /// Registered domain.
    #[serde(default)]
    pub domain: Option<String>,
}

impl ProjectInfo {
    /// Returns the credential pair, if the authority disclosed the code.
    #[must_use]
    pub fn credentials(&self) -> Option<ProjectCredentials> {
        ProjectCredentials::from_parts(Some(self.id.clone()), self.activation_code.clone())
    }
}

/// Envelope used by the authority: `{ "data": { ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    /// Payload; absent when the lookup found nothing.
    pub data: Option<T>,
}

/// Last known status as reported by `GET /project/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    /// Status label (e.g. `active`, `suspended`).
    #[serde(default)]
    pub status: Option<String>,
    /// Last liveness timestamp the authority recorded.
    #[serde(default)]
    pub last_seen: Option<String>,
    /// When the project was first registered.
    #[serde(default)]
    pub created_at: Option<String>,
}
