//! Idempotent project registration.
//!
//! Concurrent first requests against a fresh install may each try to create
//! the project. The authority accepts one and rejects the rest with a
//! duplicate-entry error; losers recover the winner's credentials with a
//! lookup by domain, so every caller converges on the same project id.

use crate::api::Authority;
use crate::payload::StoreProjectRequest;
use keeper_types::{ProjectCredentials, SystemInfo, UniqueId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the credentials were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPath {
    /// The authority created a new project record.
    Created,
    /// A record already existed and was adopted via lookup-by-domain.
    Recovered,
}

/// Outcome of [`Registrar::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered {
        credentials: ProjectCredentials,
        path: RegistrationPath,
    },
    /// Registration did not complete; the next process tries again.
    NotRegistered,
}

impl Registration {
    /// Returns the credentials, if registered.
    pub fn credentials(&self) -> Option<&ProjectCredentials> {
        match self {
            Registration::Registered { credentials, .. } => Some(credentials),
            Registration::NotRegistered => None,
        }
    }

    /// Consumes the outcome, returning the credentials if registered.
    pub fn into_credentials(self) -> Option<ProjectCredentials> {
        match self {
            Registration::Registered { credentials, .. } => Some(credentials),
            Registration::NotRegistered => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Registration::Registered { .. })
    }
}

/// Registers this installation with the remote authority.
#[derive(Clone)]
pub struct Registrar {
    authority: Arc<dyn Authority>,
}

impl Registrar {
    pub fn new(authority: Arc<dyn Authority>) -> Self {
        Self { authority }
    }

    /// Creates the project, falling back to lookup-by-domain on conflict.
    ///
    /// Makes at most one creation attempt. Any failure other than a conflict
    /// yields [`Registration::NotRegistered`].
    pub async fn register(&self, identity: &UniqueId, system: &SystemInfo) -> Registration {
        let request = StoreProjectRequest::new(identity, system);
        match self.authority.store_project(&request).await {
            Ok(credentials) => {
                info!(
                    domain = %system.domain,
                    project_id = %credentials.project_id(),
                    "project registered"
                );
                Registration::Registered {
                    credentials,
                    path: RegistrationPath::Created,
                }
            }
            Err(e) if e.is_duplicate_entry() => {
                debug!(domain = %system.domain, "project already registered, looking up by domain");
                match self.recover(&system.domain).await {
                    Some(credentials) => Registration::Registered {
                        credentials,
                        path: RegistrationPath::Recovered,
                    },
                    None => Registration::NotRegistered,
                }
            }
            Err(e) => {
                warn!(domain = %system.domain, error = %e, "registration failed");
                Registration::NotRegistered
            }
        }
    }

    /// Fetches the existing credentials for `domain`.
    pub async fn recover(&self, domain: &str) -> Option<ProjectCredentials> {
        match self.authority.recover_project(domain).await {
            Ok(Some(info)) => {
                let credentials = info.credentials();
                if credentials.is_none() {
                    warn!(domain = %domain, "project record has no activation code");
                }
                credentials
            }
            Ok(None) => {
                warn!(domain = %domain, "no project found for domain");
                None
            }
            Err(e) => {
                warn!(domain = %domain, error = %e, "project lookup failed");
                None
            }
        }
    }
}
