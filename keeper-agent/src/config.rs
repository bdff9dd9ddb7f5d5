//! Agent configuration and discovery from the host's `.env`.

use keeper_client::ClientConfig;
use keeper_identity::env_file::{ENV_FILE, lookup, read_env};
use keeper_identity::{AppSecret, IdentitySeed, IdentityStrategy, StorageKind};
use keeper_types::AppDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable that overrides the authority base URL.
pub const BASE_URL_VAR: &str = "KEEPER_BASE_URL";
/// Environment variable naming the host installation root (read by the CLI).
pub const PROJECT_ROOT_VAR: &str = "KEEPER_PROJECT_ROOT";

/// Everything the agent needs to run inside one host installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub project_root: PathBuf,
    pub app_name: String,
    #[serde(skip)]
    pub app_secret: Option<AppSecret>,
    /// Has no default: the operator decides whether identity survives reinstalls.
    pub identity_strategy: IdentityStrategy,
    #[serde(default)]
    pub storage: StorageKind,
    /// Domain used for scheduled ticks and CLI commands.
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub debug: bool,
    /// Minimum pause between failed registration attempts within one process.
    #[serde(default = "default_retry_secs")]
    pub registration_retry_secs: u64,
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_retry_secs() -> u64 {
    300
}

impl AgentConfig {
    /// Config with defaults for everything but the root, name and strategy.
    pub fn new(project_root: impl Into<PathBuf>, app_name: impl Into<String>, strategy: IdentityStrategy) -> Self {
        Self {
            project_root: project_root.into(),
            app_name: app_name.into(),
            app_secret: None,
            identity_strategy: strategy,
            storage: StorageKind::default(),
            domain: None,
            environment: default_environment(),
            debug: false,
            registration_retry_secs: default_retry_secs(),
            client: ClientConfig::default(),
        }
    }

    /// Fills name, secret, environment, debug flag and domain from `<root>/.env`.
    ///
    /// `APP_NAME`, `APP_KEY`, `APP_ENV`, `APP_DEBUG` and `APP_URL` are read;
    /// `KEEPER_BASE_URL` is taken from the process environment first, then
    /// from the file.
    pub fn discover(project_root: impl Into<PathBuf>, strategy: IdentityStrategy) -> Self {
        let project_root = project_root.into();
        let entries = match read_env(&project_root.join(ENV_FILE)) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %project_root.display(), error = %e, "could not read host .env");
                Vec::new()
            }
        };

        let app_name = lookup(&entries, "APP_NAME")
            .map(str::to_string)
            .unwrap_or_else(|| name_from_dir(&project_root));
        let mut config = Self::new(project_root, app_name, strategy);
        config.app_secret = lookup(&entries, "APP_KEY").and_then(AppSecret::new);
        if let Some(env) = lookup(&entries, "APP_ENV") {
            config.environment = env.to_string();
        }
        config.debug = lookup(&entries, "APP_DEBUG").is_some_and(parse_bool);
        config.domain = lookup(&entries, "APP_URL").and_then(host_of);

        let base_url = std::env::var(BASE_URL_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup(&entries, BASE_URL_VAR).map(str::to_string));
        if let Some(base_url) = base_url {
            config.client.base_url = base_url;
        }

        debug!(
            app_name = %config.app_name,
            environment = %config.environment,
            has_secret = config.app_secret.is_some(),
            "discovered host configuration"
        );
        config
    }

    pub fn seed(&self) -> IdentitySeed {
        IdentitySeed {
            project_root: self.project_root.clone(),
            app_name: self.app_name.clone(),
            app_secret: self.app_secret.clone(),
        }
    }

    pub fn app_descriptor(&self) -> AppDescriptor {
        AppDescriptor {
            environment: self.environment.clone(),
            debug: self.debug,
            ..AppDescriptor::new(self.app_name.clone())
        }
    }

    /// Domain for scheduled ticks, falling back to `localhost`.
    pub fn domain_or_default(&self) -> &str {
        self.domain.as_deref().unwrap_or("localhost")
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn host_of(app_url: &str) -> Option<String> {
    url::Url::parse(app_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

/// Capitalised last path component, e.g. `/srv/shop` gives `Shop`.
fn name_from_dir(root: &Path) -> String {
    let dir = root
        .canonicalize()
        .unwrap_or_else(|_| root.to_path_buf())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut chars = dir.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Application".to_string(),
    }
}
