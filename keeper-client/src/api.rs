//! HTTP client for the remote authority.
//!
//! [`Authority`] is the seam the registration, heartbeat and gate layers talk
//! through; [`AuthorityClient`] is the reqwest implementation. Every call
//! carries its own deadline taken from [`ClientConfig`].

use crate::config::{CallClass, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::payload::{
    ActivationCheck, CheckStatusRequest, CheckStatusResponse, ConfigSnapshot, HeartbeatPayload,
    LastSeenPayload, RegenerateResponse, StoreProjectRequest, StoreProjectResponse,
    SyncConfigurationRequest,
};
use async_trait::async_trait;
use keeper_types::{DataEnvelope, ProjectCredentials, ProjectId, ProjectInfo, ProjectStatus};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Operations offered by the remote authority.
#[async_trait]
pub trait Authority: Send + Sync {
    /// `POST /store-project`. Fails with a duplicate-entry error on conflict.
    async fn store_project(&self, request: &StoreProjectRequest<'_>) -> ClientResult<ProjectCredentials>;

    /// `GET /project/info?domain=`. `Ok(None)` when nothing is registered.
    async fn project_info_by_domain(&self, domain: &str) -> ClientResult<Option<ProjectInfo>>;

    /// `GET /project/info?domain=` on the registration deadline, for conflict recovery.
    async fn recover_project(&self, domain: &str) -> ClientResult<Option<ProjectInfo>>;

    /// `GET /project/info?project_id=`.
    async fn project_info_by_id(&self, project_id: &ProjectId) -> ClientResult<Option<ProjectInfo>>;

    /// `POST /project/{id}/reactivate`. `Ok(())` only on a success status.
    async fn reactivate(&self, project_id: &ProjectId) -> ClientResult<()>;

    /// `POST /project-heartbeat/`.
    async fn heartbeat(&self, payload: &HeartbeatPayload) -> ClientResult<()>;

    /// `POST /project/update-last-seen`.
    async fn update_last_seen(&self, payload: &LastSeenPayload) -> ClientResult<()>;

    /// `POST /check-project-status`.
    async fn check_project_status(&self, domain: &str, activation_code: &str) -> ClientResult<ActivationCheck>;

    /// `POST /project/{id}/sync-configuration`.
    async fn sync_configuration(
        &self,
        credentials: &ProjectCredentials,
        config: &ConfigSnapshot,
    ) -> ClientResult<()>;

    /// `GET /project/status`.
    async fn project_status(&self, credentials: &ProjectCredentials) -> ClientResult<ProjectStatus>;

    /// `POST /regenerate-activation-code`. Returns the new code.
    async fn regenerate_activation_code(&self, credentials: &ProjectCredentials) -> ClientResult<String>;
}

/// reqwest-backed [`Authority`].
#[derive(Debug, Clone)]
pub struct AuthorityClient {
    config: ClientConfig,
    client: Client,
}

impl AuthorityClient {
    /// Builds a client from configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.ceiling())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn get(&self, path: &str, class: CallClass) -> RequestBuilder {
        self.client
            .get(self.config.endpoint(path))
            .header("Accept", "application/json")
            .timeout(self.config.timeout(class))
    }

    fn post(&self, path: &str, class: CallClass) -> RequestBuilder {
        self.client
            .post(self.config.endpoint(path))
            .header("Accept", "application/json")
            .timeout(self.config.timeout(class))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))
    }

    async fn project_info(
        &self,
        query: &[(&str, &str)],
        class: CallClass,
    ) -> ClientResult<Option<ProjectInfo>> {
        let response = self.get("project/info", class).query(query).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response).await?;
        let envelope: DataEnvelope<ProjectInfo> = Self::json(response).await?;
        Ok(envelope.data)
    }
}

/// Maps a non-success response onto [`ClientError`], classifying conflicts.
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::CONFLICT || body.to_ascii_lowercase().contains("duplicate entry") {
        return Err(ClientError::Duplicate(body));
    }
    Err(ClientError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Authority for AuthorityClient {
    async fn store_project(&self, request: &StoreProjectRequest<'_>) -> ClientResult<ProjectCredentials> {
        debug!(domain = %request.system.domain, "storing project");
        let response = self
            .post("store-project", CallClass::Registration)
            .json(request)
            .send()
            .await?;
        let response = check(response).await?;
        let body: StoreProjectResponse = Self::json(response).await?;
        ProjectCredentials::from_parts(body.project_id, body.activation_code)
            .ok_or_else(|| ClientError::Malformed("registration response lacks credentials".to_string()))
    }

    async fn project_info_by_domain(&self, domain: &str) -> ClientResult<Option<ProjectInfo>> {
        self.project_info(&[("domain", domain)], CallClass::Status).await
    }

    async fn recover_project(&self, domain: &str) -> ClientResult<Option<ProjectInfo>> {
        self.project_info(&[("domain", domain)], CallClass::Registration).await
    }

    async fn project_info_by_id(&self, project_id: &ProjectId) -> ClientResult<Option<ProjectInfo>> {
        self.project_info(&[("project_id", project_id.as_str())], CallClass::Status)
            .await
    }

    async fn reactivate(&self, project_id: &ProjectId) -> ClientResult<()> {
        let path = format!("project/{}/reactivate", urlencoding::encode(project_id.as_str()));
        let response = self.post(&path, CallClass::Activation).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn heartbeat(&self, payload: &HeartbeatPayload) -> ClientResult<()> {
        let response = self
            .post("project-heartbeat/", CallClass::Liveness)
            .json(payload)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn update_last_seen(&self, payload: &LastSeenPayload) -> ClientResult<()> {
        let response = self
            .post("project/update-last-seen", CallClass::Liveness)
            .json(payload)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn check_project_status(&self, domain: &str, activation_code: &str) -> ClientResult<ActivationCheck> {
        let response = self
            .post("check-project-status", CallClass::Activation)
            .json(&CheckStatusRequest {
                domain,
                activation_code,
            })
            .send()
            .await?;
        let response = check(response).await?;
        let body: CheckStatusResponse = Self::json(response).await?;
        Ok(body.into_check())
    }

    async fn sync_configuration(
        &self,
        credentials: &ProjectCredentials,
        config: &ConfigSnapshot,
    ) -> ClientResult<()> {
        let path = format!(
            "project/{}/sync-configuration",
            urlencoding::encode(credentials.project_id().as_str())
        );
        let response = self
            .post(&path, CallClass::Liveness)
            .json(&SyncConfigurationRequest {
                project_id: credentials.project_id(),
                activation_code: credentials.activation_code(),
                config,
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn project_status(&self, credentials: &ProjectCredentials) -> ClientResult<ProjectStatus> {
        let response = self
            .get("project/status", CallClass::Status)
            .query(&[
                ("project_id", credentials.project_id().as_str()),
                ("activation_code", credentials.activation_code()),
            ])
            .send()
            .await?;
        let response = check(response).await?;
        let envelope: DataEnvelope<ProjectStatus> = Self::json(response).await?;
        envelope
            .data
            .ok_or_else(|| ClientError::Malformed("status response has no data".to_string()))
    }

    async fn regenerate_activation_code(&self, credentials: &ProjectCredentials) -> ClientResult<String> {
        let response = self
            .post("regenerate-activation-code", CallClass::Activation)
            .json(&serde_json::json!({
                "project_id": credentials.project_id(),
                "activation_code": credentials.activation_code(),
            }))
            .send()
            .await?;
        let response = check(response).await?;
        let body: RegenerateResponse = Self::json(response).await?;
        body.activation_code
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| ClientError::Malformed("no activation code in response".to_string()))
    }
}
