//! The identity store contract and the provider that drives it.

use crate::error::IdentityResult;
use crate::strategy::{IdentitySeed, IdentityStrategy};
use keeper_types::UniqueId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Durable, write-once storage for an installation identity.
///
/// Implementations must never overwrite a decodable identity: `persist`
/// returns whichever value won when several writers race.
pub trait IdentityStore: Send + Sync {
    /// Reads the stored identity, if any.
    fn load(&self) -> IdentityResult<Option<UniqueId>>;

    /// Writes `candidate` unless an identity already exists.
    /// Returns the identity that is now on disk.
    fn persist(&self, candidate: &UniqueId) -> IdentityResult<UniqueId>;

    /// Whether this installation already completed registration for `domain`.
    fn is_registered(&self, domain: &str) -> bool;

    /// Records a completed registration for `domain`.
    fn mark_registered(&self, domain: &str) -> IdentityResult<()>;
}

/// Which artifact layout to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    /// Plain identity file plus per-domain registration flag files.
    #[default]
    FlagFile,
    /// Encrypted token injected into the host's `.env`.
    EnvFile,
}

impl std::str::FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag-file" | "flag" => Ok(Self::FlagFile),
            "env-file" | "env" => Ok(Self::EnvFile),
            other => Err(format!("unknown storage kind: {other}")),
        }
    }
}

/// A resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The identity token.
    pub unique_id: UniqueId,
    /// False when the store was unwritable and the value lives only in memory.
    pub persisted: bool,
}

/// Stable per-domain suffix for registration markers.
pub(crate) fn domain_hash(domain: &str) -> String {
    let digest = Sha256::digest(domain.trim().to_ascii_lowercase().as_bytes());
    hex::encode(&digest[..16])
}

/// Resolves the installation identity, creating and persisting it on first need.
pub struct IdentityProvider {
    seed: IdentitySeed,
    strategy: IdentityStrategy,
    store: Arc<dyn IdentityStore>,
    resolved: OnceLock<Identity>,
}

impl IdentityProvider {
    /// Creates a provider over the built-in store for `kind`.
    pub fn new(seed: IdentitySeed, strategy: IdentityStrategy, kind: StorageKind) -> IdentityResult<Self> {
        let store: Arc<dyn IdentityStore> = match kind {
            StorageKind::FlagFile => Arc::new(crate::FlagFileStore::new(&seed.project_root)),
            StorageKind::EnvFile => Arc::new(crate::EnvFileStore::new(
                &seed.project_root,
                seed.app_secret.as_ref(),
            )),
        };
        Self::with_store(seed, strategy, store)
    }

    /// Creates a provider over a caller-supplied store.
    pub fn with_store(
        seed: IdentitySeed,
        strategy: IdentityStrategy,
        store: Arc<dyn IdentityStore>,
    ) -> IdentityResult<Self> {
        strategy.validate(&seed)?;
        Ok(Self {
            seed,
            strategy,
            store,
            resolved: OnceLock::new(),
        })
    }

    /// Returns the strategy in use.
    #[must_use]
    pub fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    /// Returns the stored identity, or derives, persists and returns a new one.
    ///
    /// Never fails: if the store cannot be written the identity is kept in
    /// memory for the life of this provider and `persisted` is false.
    pub fn get_or_create_identity(&self) -> Identity {
        self.resolved.get_or_init(|| self.resolve()).clone()
    }

    fn resolve(&self) -> Identity {
        match self.store.load() {
            Ok(Some(unique_id)) => {
                debug!(%unique_id, "loaded existing identity");
                return Identity {
                    unique_id,
                    persisted: true,
                };
            }
            Ok(None) => {}
            Err(e) => warn!("identity artifact unreadable, deriving a new candidate: {e}"),
        }

        let candidate = match self.strategy.derive(&self.seed) {
            Ok(id) => id,
            Err(e) => {
                warn!("{} derivation failed ({e}), using random", self.strategy);
                IdentityStrategy::Random
                    .derive(&self.seed)
                    .unwrap_or_else(|_| UniqueId::from_digest(uuid::Uuid::new_v4().as_bytes()))
            }
        };

        match self.store.persist(&candidate) {
            Ok(unique_id) => {
                if unique_id == candidate {
                    info!(%unique_id, strategy = %self.strategy, "created installation identity");
                } else {
                    info!(%unique_id, "adopted identity written by a concurrent process");
                }
                Identity {
                    unique_id,
                    persisted: true,
                }
            }
            Err(e) => {
                warn!("identity store unwritable, identity will not survive restart: {e}");
                Identity {
                    unique_id: candidate,
                    persisted: false,
                }
            }
        }
    }

    /// Whether registration already completed for `domain`.
    #[must_use]
    pub fn is_registered(&self, domain: &str) -> bool {
        self.store.is_registered(domain)
    }

    /// Records a completed registration. Returns false if the marker could not be written.
    pub fn mark_registered(&self, domain: &str) -> bool {
        match self.store.mark_registered(domain) {
            Ok(()) => true,
            Err(e) => {
                warn!(%domain, "could not record registration: {e}");
                false
            }
        }
    }
}
