//! Identity file plus per-domain registration flag files.
//!
//! Layout under the project root:
//! - `.project_unique_id` holds the plain identity token
//! - `.project_registered_<hash>` exists once registration for a domain succeeded

use crate::error::{IdentityError, IdentityResult};
use crate::store::{domain_hash, IdentityStore};
use keeper_types::UniqueId;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name of the identity artifact.
pub const IDENTITY_FILE: &str = ".project_unique_id";

/// Prefix of the per-domain registration flag file.
pub const REGISTERED_FLAG_PREFIX: &str = ".project_registered_";

/// Flag-file backed [`IdentityStore`].
#[derive(Debug, Clone)]
pub struct FlagFileStore {
    root: PathBuf,
}

impl FlagFileStore {
    /// Creates a store rooted at `project_root`.
    #[must_use]
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.to_path_buf(),
        }
    }

    /// Path of the identity artifact.
    #[must_use]
    pub fn identity_path(&self) -> PathBuf {
        self.root.join(IDENTITY_FILE)
    }

    /// Path of the registration flag for `domain`.
    #[must_use]
    pub fn flag_path(&self, domain: &str) -> PathBuf {
        self.root
            .join(format!("{REGISTERED_FLAG_PREFIX}{}", domain_hash(domain)))
    }

    fn read_existing(&self) -> IdentityResult<Option<UniqueId>> {
        let raw = match fs::read_to_string(self.identity_path()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        UniqueId::parse(raw)
            .map(Some)
            .map_err(|e| IdentityError::Corrupt(e.to_string()))
    }
}

impl IdentityStore for FlagFileStore {
    fn load(&self) -> IdentityResult<Option<UniqueId>> {
        self.read_existing()
    }

    fn persist(&self, candidate: &UniqueId) -> IdentityResult<UniqueId> {
        // Write a complete temp file, then link it into place without
        // clobbering; readers never observe a half-written artifact.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(candidate.as_str().as_bytes())?;
        tmp.flush()?;

        match tmp.persist_noclobber(self.identity_path()) {
            Ok(_) => Ok(candidate.clone()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                match self.read_existing() {
                    Ok(Some(existing)) => Ok(existing),
                    // Present but empty or undecodable: replace it.
                    Ok(None) | Err(IdentityError::Corrupt(_)) => {
                        warn!("replacing unusable identity artifact");
                        e.file.persist(self.identity_path()).map_err(|e| e.error)?;
                        Ok(candidate.clone())
                    }
                    Err(other) => Err(other),
                }
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn is_registered(&self, domain: &str) -> bool {
        self.flag_path(domain).exists()
    }

    fn mark_registered(&self, domain: &str) -> IdentityResult<()> {
        let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        fs::write(self.flag_path(domain), stamp)?;
        Ok(())
    }
}
