//! Encrypted identity token injected into the host's `.env` file.
//!
//! The store only ever appends. Existing lines are left untouched, and when
//! concurrent writers both append, the first decodable occurrence in the file
//! wins for every later reader.

use crate::cipher::{DerivedKey, TokenCipher};
use crate::error::IdentityResult;
use crate::store::{domain_hash, IdentityStore};
use crate::strategy::AppSecret;
use keeper_types::UniqueId;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the host configuration file.
pub const ENV_FILE: &str = ".env";

/// Key under which the sealed identity is stored.
pub const IDENTITY_KEY: &str = "KEEPER_PROJECT_ID";

/// Prefix of the per-domain registration marker key.
pub const REGISTERED_KEY_PREFIX: &str = "KEEPER_REGISTERED_";

/// Parses `KEY=value` lines, skipping blanks and `#` comments.
///
/// Values are trimmed and one level of matching quotes is removed. Keys may
/// repeat; order is preserved.
#[must_use]
pub fn parse_env(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

/// Returns the first value for `key`, ignoring empty values.
#[must_use]
pub fn lookup<'a>(entries: &'a [(String, String)], key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

/// Reads and parses an env file; a missing file yields no entries.
pub fn read_env(path: &Path) -> io::Result<Vec<(String, String)>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_env(&contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// `.env`-backed [`IdentityStore`].
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    path: PathBuf,
    cipher: TokenCipher,
}

impl EnvFileStore {
    /// Creates a store for `<project_root>/.env`, keyed from local material.
    #[must_use]
    pub fn new(project_root: &Path, secret: Option<&AppSecret>) -> Self {
        Self {
            path: project_root.join(ENV_FILE),
            cipher: TokenCipher::new(DerivedKey::from_local_material(secret, project_root)),
        }
    }

    /// Path of the env file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn first_decodable(&self) -> IdentityResult<Option<UniqueId>> {
        let entries = read_env(&self.path)?;
        let mut last_error = None;
        for (_, token) in entries.iter().filter(|(k, _)| k == IDENTITY_KEY) {
            match self.cipher.open(token) {
                Ok(id) => return Ok(Some(id)),
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Appends one `KEY=value` line, adding a separating newline when needed.
    fn append_line(&self, key: &str, value: &str) -> io::Result<()> {
        let needs_newline = match fs::read(&self.path) {
            Ok(bytes) => bytes.last().is_some_and(|b| *b != b'\n'),
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        let line = if needs_newline {
            format!("\n{key}={value}\n")
        } else {
            format!("{key}={value}\n")
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()
    }
}

impl IdentityStore for EnvFileStore {
    fn load(&self) -> IdentityResult<Option<UniqueId>> {
        self.first_decodable()
    }

    fn persist(&self, candidate: &UniqueId) -> IdentityResult<UniqueId> {
        if let Ok(Some(existing)) = self.first_decodable() {
            return Ok(existing);
        }

        let token = self.cipher.seal(candidate)?;
        self.append_line(IDENTITY_KEY, &token)?;
        debug!(path = %self.path.display(), "injected identity token");

        // Read back: an earlier concurrent append takes precedence.
        Ok(self.first_decodable()?.unwrap_or_else(|| candidate.clone()))
    }

    fn is_registered(&self, domain: &str) -> bool {
        let key = format!("{REGISTERED_KEY_PREFIX}{}", domain_hash(domain));
        read_env(&self.path)
            .map(|entries| lookup(&entries, &key).is_some())
            .unwrap_or(false)
    }

    fn mark_registered(&self, domain: &str) -> IdentityResult<()> {
        if self.is_registered(domain) {
            return Ok(());
        }
        let key = format!("{REGISTERED_KEY_PREFIX}{}", domain_hash(domain));
        let stamp = chrono::Utc::now().timestamp().to_string();
        self.append_line(&key, &stamp)?;
        Ok(())
    }
}
