//! Per-installation lifecycle: identity, registration, liveness and the gate.

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use keeper_client::{
    Authority, AuthorityClient, CallClass, ConfigSnapshot, HeartbeatEmitter, Registrar,
    Registration, RegistrationPath,
};
use keeper_gate::Gatekeeper;
use keeper_identity::{Identity, IdentityProvider};
use keeper_types::{AppDescriptor, ProjectCredentials, ProjectStatus, RequestContext, SystemInfo};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The licensing agent embedded in one host process.
///
/// Credentials live in memory only. They are a cache of what the authority
/// holds and are re-fetched by the next process.
pub struct Agent {
    config: AgentConfig,
    app: AppDescriptor,
    identity: IdentityProvider,
    authority: Arc<dyn Authority>,
    registrar: Registrar,
    emitter: HeartbeatEmitter,
    gatekeeper: Gatekeeper,
    credentials: RwLock<Option<ProjectCredentials>>,
    /// Time of the last failed registration attempt.
    last_attempt: Mutex<Option<Instant>>,
}

impl Agent {
    /// Builds an agent talking to the authority configured in `config.client`.
    pub fn new(config: AgentConfig) -> AgentResult<Self> {
        let client = AuthorityClient::new(config.client.clone())?;
        Self::with_authority(config, Arc::new(client))
    }

    /// Builds an agent over a caller-supplied authority.
    pub fn with_authority(config: AgentConfig, authority: Arc<dyn Authority>) -> AgentResult<Self> {
        let identity = IdentityProvider::new(config.seed(), config.identity_strategy, config.storage)?;
        let emitter = HeartbeatEmitter::new(
            Arc::clone(&authority),
            config.client.timeout(CallClass::Liveness),
        );
        Ok(Self {
            app: config.app_descriptor(),
            registrar: Registrar::new(Arc::clone(&authority)),
            gatekeeper: Gatekeeper::from_config(Arc::clone(&authority), &config.client),
            identity,
            authority,
            emitter,
            config,
            credentials: RwLock::new(None),
            last_attempt: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    /// The installation identity, created on first call.
    pub fn identity(&self) -> Identity {
        self.identity.get_or_create_identity()
    }

    /// Whether the durable registration marker exists for `domain`.
    pub fn is_registered(&self, domain: &str) -> bool {
        self.identity.is_registered(domain)
    }

    /// Current in-memory credentials, if any.
    pub fn credentials(&self) -> Option<ProjectCredentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_credentials(&self, credentials: ProjectCredentials) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    /// Makes sure this installation has an identity and credentials.
    ///
    /// Returns immediately once credentials are held. Only one attempt runs at
    /// a time; concurrent callers return without waiting. After a failed
    /// attempt, further attempts are skipped for `registration_retry_secs`.
    pub async fn boot(&self, ctx: &RequestContext) -> Option<ProjectCredentials> {
        if let Some(credentials) = self.credentials() {
            return Some(credentials);
        }
        let Ok(mut last_attempt) = self.last_attempt.try_lock() else {
            debug!(domain = %ctx.domain, "registration already in progress");
            return None;
        };
        if let Some(credentials) = self.credentials() {
            return Some(credentials);
        }
        let retry_after = Duration::from_secs(self.config.registration_retry_secs);
        if last_attempt.is_some_and(|at| at.elapsed() < retry_after) {
            return None;
        }

        let credentials = self.ensure_registered(ctx).await;
        match &credentials {
            Some(c) => {
                self.set_credentials(c.clone());
                *last_attempt = None;
            }
            None => *last_attempt = Some(Instant::now()),
        }
        credentials
    }

    async fn ensure_registered(&self, ctx: &RequestContext) -> Option<ProjectCredentials> {
        let identity = self.identity.get_or_create_identity();

        if self.identity.is_registered(&ctx.domain) {
            debug!(domain = %ctx.domain, "registration marker present, recovering credentials");
            return self.registrar.recover(&ctx.domain).await;
        }

        let system = SystemInfo::assemble(&self.app, ctx);
        match self.registrar.register(&identity.unique_id, &system).await {
            Registration::Registered { credentials, path } => {
                self.identity.mark_registered(&ctx.domain);
                if path == RegistrationPath::Created {
                    info!(unique_id = %identity.unique_id, "installation registered");
                }
                self.after_registration(&credentials, &system).await;
                Some(credentials)
            }
            Registration::NotRegistered => None,
        }
    }

    /// Pushes the non-secret configuration and sends the first heartbeat.
    async fn after_registration(&self, credentials: &ProjectCredentials, system: &SystemInfo) {
        let snapshot = ConfigSnapshot::from(system);
        let sync = self.authority.sync_configuration(credentials, &snapshot);
        match tokio::time::timeout(self.emitter.bound(), sync).await {
            Ok(Ok(())) => debug!("configuration synced"),
            Ok(Err(e)) => warn!(error = %e, "configuration sync failed"),
            Err(_) => warn!("configuration sync timed out"),
        }
        self.emitter.beat(Some(credentials), system).await;
    }

    /// Sends a heartbeat for `ctx`. A no-op until registered.
    pub async fn heartbeat(&self, ctx: &RequestContext) {
        let system = SystemInfo::assemble(&self.app, ctx);
        self.emitter.beat(self.credentials().as_ref(), &system).await;
    }

    /// Records that the installation is alive. A no-op until registered.
    pub async fn update_last_seen(&self) {
        self.emitter.update_last_seen(self.credentials().as_ref()).await;
    }

    /// Last known status, as reported by the authority.
    pub async fn project_status(&self) -> AgentResult<ProjectStatus> {
        let credentials = self.credentials().ok_or(AgentError::NotRegistered)?;
        Ok(self.authority.project_status(&credentials).await?)
    }

    /// Asks the authority for a new activation code and adopts it.
    pub async fn regenerate_activation_code(&self) -> AgentResult<()> {
        let credentials = self.credentials().ok_or(AgentError::NotRegistered)?;
        let code = self.authority.regenerate_activation_code(&credentials).await?;
        let mut guard = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = guard.as_mut() {
            current.rotate_code(code);
        }
        info!(project_id = %credentials.project_id(), "activation code regenerated");
        Ok(())
    }
}
