mod common;

use common::*;
use keeper_agent::{Agent, AgentError};
use keeper_identity::{IdentityStrategy, StorageKind};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn created() -> serde_json::Value {
    serde_json::json!({"project_id": 42, "activation_code": "ACT-42"})
}

// ── Boot ────────────────────────────────────────────────────────

#[tokio::test]
async fn boot_registers_syncs_and_beats_once() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    mount_store(&authority, 200, created(), 1).await;
    Mock::given(method("POST"))
        .and(path("/api/project/42/sync-configuration"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&authority)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/project-heartbeat/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&authority)
        .await;

    let agent = agent(&root, &authority);
    let credentials = agent.boot(&ctx()).await.unwrap();
    assert_eq!(credentials.project_id().as_str(), "42");
    assert_eq!(agent.credentials(), Some(credentials));
    assert!(agent.is_registered(DOMAIN));

    // Held credentials short-circuit later boots.
    agent.boot(&ctx()).await.unwrap();
}

#[tokio::test]
async fn next_process_recovers_instead_of_registering() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    mount_store(&authority, 200, created(), 1).await;
    mount_ok(&authority, "POST", "/api/project/42/sync-configuration").await;
    mount_ok(&authority, "POST", "/api/project-heartbeat/").await;
    Mock::given(method("GET"))
        .and(path("/api/project/info"))
        .and(query_param("domain", DOMAIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_info(true)))
        .expect(1)
        .mount(&authority)
        .await;

    let first = agent(&root, &authority);
    first.boot(&ctx()).await.unwrap();
    let first_identity = first.identity();
    drop(first);

    let second = agent(&root, &authority);
    let credentials = second.boot(&ctx()).await.unwrap();
    assert_eq!(credentials.activation_code(), "ACT-42");
    assert_eq!(second.identity().unique_id, first_identity.unique_id);
}

#[tokio::test]
async fn failed_registration_leaves_no_marker_and_retries_later() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    mount_store(&authority, 503, serde_json::json!({"message": "maintenance"}), 2).await;

    let mut config = config(&root, &authority);
    config.registration_retry_secs = 0;
    let agent = Agent::new(config).unwrap();

    assert!(agent.boot(&ctx()).await.is_none());
    assert!(!agent.is_registered(DOMAIN));
    assert!(agent.boot(&ctx()).await.is_none());
}

#[tokio::test]
async fn failed_registration_is_not_retried_within_backoff() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    mount_store(&authority, 500, serde_json::json!({"message": "boom"}), 1).await;

    let agent = agent(&root, &authority);
    assert!(agent.boot(&ctx()).await.is_none());
    assert!(agent.boot(&ctx()).await.is_none());
}

#[tokio::test]
async fn duplicate_on_first_boot_adopts_existing_project() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/store-project"))
        .respond_with(ResponseTemplate::new(500).set_body_string("1062 Duplicate entry 'shop.example'"))
        .mount(&authority)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/project/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_info(true)))
        .mount(&authority)
        .await;
    mount_ok(&authority, "POST", "/api/project/42/sync-configuration").await;
    mount_ok(&authority, "POST", "/api/project-heartbeat/").await;

    let agent = agent(&root, &authority);
    let credentials = agent.boot(&ctx()).await.unwrap();
    assert_eq!(credentials.project_id().as_str(), "42");
    assert!(agent.is_registered(DOMAIN));
}

#[tokio::test]
async fn unreachable_authority_never_fails_boot() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    let agent = agent(&root, &authority);
    drop(authority);

    assert!(agent.boot(&ctx()).await.is_none());
    assert!(agent.identity().persisted);
}

#[tokio::test]
async fn env_file_storage_injects_identity() {
    let root = TempDir::new().unwrap();
    write_env(&root, "APP_NAME=Shop\nAPP_KEY=base64:dGVzdC1rZXk=\n");
    let authority = MockServer::start().await;
    mount_store(&authority, 200, created(), 1).await;
    mount_ok(&authority, "POST", "/api/project/42/sync-configuration").await;
    mount_ok(&authority, "POST", "/api/project-heartbeat/").await;

    let mut config = config(&root, &authority);
    config.storage = StorageKind::EnvFile;
    let agent = Agent::new(config).unwrap();
    agent.boot(&ctx()).await.unwrap();

    let env = std::fs::read_to_string(root.path().join(".env")).unwrap();
    assert!(env.starts_with("APP_NAME=Shop\nAPP_KEY=base64:dGVzdC1rZXk=\n"));
    assert!(env.contains("KEEPER_PROJECT_ID="));
    assert!(env.contains("KEEPER_REGISTERED_"));
}

// ── Liveness ────────────────────────────────────────────────────

#[tokio::test]
async fn liveness_is_silent_until_registered() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&authority)
        .await;

    let agent = agent(&root, &authority);
    agent.heartbeat(&ctx()).await;
    agent.update_last_seen().await;
}

#[tokio::test]
async fn update_last_seen_after_boot() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    mount_store(&authority, 200, created(), 1).await;
    mount_ok(&authority, "POST", "/api/project/42/sync-configuration").await;
    mount_ok(&authority, "POST", "/api/project-heartbeat/").await;
    mount_ok(&authority, "POST", "/api/project/update-last-seen").await;

    let agent = agent(&root, &authority);
    agent.boot(&ctx()).await.unwrap();
    agent.update_last_seen().await;
    assert_eq!(hits(&authority, "/api/project/update-last-seen").await, 1);
}

// ── Auxiliary calls ─────────────────────────────────────────────

#[tokio::test]
async fn project_status_requires_registration() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    let err = agent(&root, &authority).project_status().await.unwrap_err();
    assert!(matches!(err, AgentError::NotRegistered));
}

#[tokio::test]
async fn regenerated_code_replaces_credentials() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    mount_store(&authority, 200, created(), 1).await;
    mount_ok(&authority, "POST", "/api/project/42/sync-configuration").await;
    mount_ok(&authority, "POST", "/api/project-heartbeat/").await;
    Mock::given(method("POST"))
        .and(path("/api/regenerate-activation-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"activation_code": "ACT-43"})))
        .mount(&authority)
        .await;

    let agent = agent(&root, &authority);
    agent.boot(&ctx()).await.unwrap();
    agent.regenerate_activation_code().await.unwrap();
    assert_eq!(agent.credentials().unwrap().activation_code(), "ACT-43");
}

// ── Construction ────────────────────────────────────────────────

#[tokio::test]
async fn deterministic_strategy_requires_secret() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    let mut config = config(&root, &authority);
    config.app_secret = None;

    assert!(matches!(Agent::new(config.clone()), Err(AgentError::Identity(_))));

    config.identity_strategy = IdentityStrategy::Random;
    assert!(Agent::new(config).is_ok());
}

#[tokio::test]
async fn heartbeat_bound_applies_to_slow_authority() {
    let root = TempDir::new().unwrap();
    let authority = MockServer::start().await;
    mount_store(&authority, 200, created(), 1).await;
    Mock::given(method("POST"))
        .and(path("/api/project/42/sync-configuration"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&authority)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/project-heartbeat/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&authority)
        .await;

    let agent = agent(&root, &authority);
    let started = std::time::Instant::now();
    assert!(agent.boot(&ctx()).await.is_some());
    assert!(started.elapsed() < Duration::from_secs(5));
}
