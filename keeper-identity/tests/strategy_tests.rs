mod common;

use common::{seed_at, seed_without_secret};
use keeper_identity::{AppSecret, IdentityError, IdentitySeed, IdentityStrategy};
use std::path::PathBuf;

// ── Deterministic ────────────────────────────────────────────────

#[test]
fn deterministic_is_reproducible() {
    let seed = seed_at(&PathBuf::from("/srv/shop"));
    let a = IdentityStrategy::Deterministic.derive(&seed).unwrap();
    let b = IdentityStrategy::Deterministic.derive(&seed).unwrap();
    assert_eq!(a, b);
    assert!(a.as_str().starts_with("PROJ_"));
}

#[test]
fn deterministic_depends_on_secret() {
    let seed = seed_at(&PathBuf::from("/srv/shop"));
    let other = IdentitySeed {
        app_secret: AppSecret::new("a different key"),
        ..seed.clone()
    };
    let a = IdentityStrategy::Deterministic.derive(&seed).unwrap();
    let b = IdentityStrategy::Deterministic.derive(&other).unwrap();
    assert_ne!(a, b);
}

#[test]
fn deterministic_depends_on_root_and_name() {
    let seed = seed_at(&PathBuf::from("/srv/shop"));
    let moved = seed_at(&PathBuf::from("/srv/shop2"));
    let renamed = IdentitySeed {
        app_name: "Store".into(),
        ..seed.clone()
    };
    let base = IdentityStrategy::Deterministic.derive(&seed).unwrap();
    assert_ne!(base, IdentityStrategy::Deterministic.derive(&moved).unwrap());
    assert_ne!(base, IdentityStrategy::Deterministic.derive(&renamed).unwrap());
}

#[test]
fn deterministic_without_secret_is_rejected() {
    let seed = seed_without_secret(&PathBuf::from("/srv/shop"));
    assert!(matches!(
        IdentityStrategy::Deterministic.validate(&seed),
        Err(IdentityError::MissingSecret)
    ));
    assert!(IdentityStrategy::Deterministic.derive(&seed).is_err());
}

// ── Random ───────────────────────────────────────────────────────

#[test]
fn random_differs_between_calls() {
    let seed = seed_without_secret(&PathBuf::from("/srv/shop"));
    assert!(IdentityStrategy::Random.validate(&seed).is_ok());
    let a = IdentityStrategy::Random.derive(&seed).unwrap();
    let b = IdentityStrategy::Random.derive(&seed).unwrap();
    assert_ne!(a, b);
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn strategy_from_str() {
    assert_eq!("deterministic".parse::<IdentityStrategy>().unwrap(), IdentityStrategy::Deterministic);
    assert_eq!(" Random ".parse::<IdentityStrategy>().unwrap(), IdentityStrategy::Random);
    assert!("hostname".parse::<IdentityStrategy>().is_err());
}

#[test]
fn strategy_serde_is_lowercase() {
    let json = serde_json::to_string(&IdentityStrategy::Deterministic).unwrap();
    assert_eq!(json, "\"deterministic\"");
}

#[test]
fn app_secret_rejects_blank_and_redacts() {
    assert!(AppSecret::new("   ").is_none());
    let secret = AppSecret::new("hunter2").unwrap();
    assert!(!format!("{secret:?}").contains("hunter2"));
}
