//! Request and response bodies of the remote authority protocol.

use keeper_types::{ProjectCredentials, ProjectId, SystemInfo, UniqueId};
use serde::{Deserialize, Serialize};

/// Timestamp format the authority expects for date fields.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn now_string() -> String {
    chrono::Utc::now().format(DATETIME_FORMAT).to_string()
}

/// `POST /store-project`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreProjectRequest<'a> {
    #[serde(flatten)]
    pub system: &'a SystemInfo,
    pub installed_at: String,
    pub activation_date: String,
    pub unique_project_id: &'a UniqueId,
}

impl<'a> StoreProjectRequest<'a> {
    pub fn new(unique_project_id: &'a UniqueId, system: &'a SystemInfo) -> Self {
        let now = now_string();
        Self {
            system,
            installed_at: now.clone(),
            activation_date: now,
            unique_project_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StoreProjectResponse {
    pub project_id: Option<ProjectId>,
    pub activation_code: Option<String>,
}

/// `POST /project-heartbeat/`.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatPayload {
    pub project_id: ProjectId,
    pub activation_code: String,
    pub domain: String,
    pub server_ip: String,
    pub server_url: String,
    pub timestamp: i64,
    pub memory_usage: u64,
    pub peak_memory: u64,
}

impl HeartbeatPayload {
    /// Builds a heartbeat from credentials, the snapshot and a memory sample.
    pub fn new(creds: &ProjectCredentials, system: &SystemInfo, memory: crate::MemorySample) -> Self {
        Self {
            project_id: creds.project_id().clone(),
            activation_code: creds.activation_code().to_string(),
            domain: system.domain.clone(),
            server_ip: system.ip_address.clone(),
            server_url: format!("http://{}", system.domain),
            timestamp: chrono::Utc::now().timestamp(),
            memory_usage: memory.resident_bytes,
            peak_memory: memory.peak_bytes,
        }
    }
}

/// `POST /project/update-last-seen`.
#[derive(Debug, Clone, Serialize)]
pub struct LastSeenPayload {
    pub project_id: ProjectId,
    pub activation_code: String,
    pub last_seen: String,
}

impl LastSeenPayload {
    pub fn new(creds: &ProjectCredentials) -> Self {
        Self {
            project_id: creds.project_id().clone(),
            activation_code: creds.activation_code().to_string(),
            last_seen: now_string(),
        }
    }
}

/// Non-secret configuration pushed after registration.
///
/// Deliberately limited to descriptive fields; credentials, keys and
/// database settings are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    pub project_name: String,
    pub domain: String,
    pub environment: String,
    pub debug_mode: bool,
    pub runtime_version: String,
    pub host_version: String,
}

impl From<&SystemInfo> for ConfigSnapshot {
    fn from(system: &SystemInfo) -> Self {
        Self {
            project_name: system.project_name.clone(),
            domain: system.domain.clone(),
            environment: system.environment.clone(),
            debug_mode: system.debug_mode,
            runtime_version: system.runtime_version.clone(),
            host_version: system.host_version.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SyncConfigurationRequest<'a> {
    pub project_id: &'a ProjectId,
    pub activation_code: &'a str,
    #[serde(flatten)]
    pub config: &'a ConfigSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CheckStatusRequest<'a> {
    pub domain: &'a str,
    pub activation_code: &'a str,
}

/// Answer of `POST /check-project-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationCheck {
    /// The authority accepted the code for this domain.
    pub valid: bool,
    /// The project is currently active.
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CheckStatusResponse {
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub data: Option<CheckStatusData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CheckStatusData {
    #[serde(default, deserialize_with = "keeper_types::deserialize_flag")]
    pub is_active: bool,
}

impl CheckStatusResponse {
    pub fn into_check(self) -> ActivationCheck {
        let valid = match &self.status {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => matches!(s.as_str(), "success" | "ok" | "valid"),
            _ => false,
        };
        ActivationCheck {
            valid,
            is_active: self.data.is_some_and(|d| d.is_active),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RegenerateResponse {
    pub activation_code: Option<String>,
}
