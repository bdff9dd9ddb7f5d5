//! Shared test helpers for identity tests.

#![allow(dead_code)]

use keeper_identity::{AppSecret, IdentitySeed};
use std::path::Path;

/// Seed with a fixed name and secret rooted at `root`.
pub fn seed_at(root: &Path) -> IdentitySeed {
    IdentitySeed {
        project_root: root.to_path_buf(),
        app_name: "Shop".to_string(),
        app_secret: AppSecret::new("base64:c2VjcmV0LWtleS1mb3ItdGVzdHM="),
    }
}

/// Seed without any secret material.
pub fn seed_without_secret(root: &Path) -> IdentitySeed {
    IdentitySeed {
        app_secret: None,
        ..seed_at(root)
    }
}
