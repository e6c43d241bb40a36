use std::sync::Arc;
use std::time::Duration;

use loan_risk::config::EngineConfig;
use loan_risk::risk::{
    FallbackStore, FileFallbackStore, PolicyOrigin, RiskEngineClient, RiskPolicy,
    RiskSettingsStore,
};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn offline_engine() -> Arc<RiskEngineClient> {
    Arc::new(
        RiskEngineClient::new(&EngineConfig {
            base_url: Url::parse("http://127.0.0.1:9").expect("url"),
            timeout: Duration::from_millis(500),
        })
        .expect("client builds"),
    )
}

fn engine_at(server: &MockServer) -> Arc<RiskEngineClient> {
    Arc::new(
        RiskEngineClient::new(&EngineConfig {
            base_url: Url::parse(&server.uri()).expect("url"),
            timeout: Duration::from_secs(2),
        })
        .expect("client builds"),
    )
}

fn edited() -> RiskPolicy {
    RiskPolicy {
        default_probability_threshold: 0.12,
        minimum_fico: 660,
        maximum_dti: 33.0,
    }
}

#[tokio::test]
async fn offline_edit_is_recovered_by_next_session() {
    let dir = TempDir::new().expect("temp dir");
    let cache = Arc::new(FileFallbackStore::new(dir.path()));

    let first = RiskSettingsStore::new(offline_engine(), cache.clone());
    assert_eq!(first.load().await, RiskPolicy::default());
    assert_eq!(first.snapshot().origin, PolicyOrigin::Default);

    let outcome = first.save(edited()).await.expect("valid policy");
    assert!(!outcome.is_synced());
    assert!(dir.path().join("risk-settings.json").exists());

    let second = RiskSettingsStore::new(offline_engine(), cache);
    assert_eq!(second.load().await, edited());
    assert_eq!(second.snapshot().origin, PolicyOrigin::Cache);
}

#[tokio::test]
async fn remote_load_refreshes_file_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "threshold": 0.12,
            "min_fico": 660,
            "max_dti": 33.0
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let cache = Arc::new(FileFallbackStore::new(dir.path()));

    let online = RiskSettingsStore::new(engine_at(&server), cache.clone());
    assert_eq!(online.load().await, edited());

    drop(server);
    let offline = RiskSettingsStore::new(offline_engine(), cache);
    assert_eq!(offline.load().await, edited());
}

#[tokio::test]
async fn legacy_partial_cache_entry_fills_defaults() {
    let dir = TempDir::new().expect("temp dir");
    let cache = Arc::new(FileFallbackStore::new(dir.path()));
    cache
        .write("risk-settings", br#"{"min_fico": 700}"#)
        .expect("seed");

    let store = RiskSettingsStore::new(offline_engine(), cache);
    let loaded = store.load().await;

    assert_eq!(loaded.minimum_fico, 700);
    assert_eq!(loaded.default_probability_threshold, 0.15);
    assert_eq!(loaded.maximum_dti, 40.0);
}

#[tokio::test]
async fn reset_does_not_touch_the_file_cache() {
    let dir = TempDir::new().expect("temp dir");
    let cache = Arc::new(FileFallbackStore::new(dir.path()));

    let store = RiskSettingsStore::new(offline_engine(), cache.clone());
    store.save(edited()).await.expect("valid policy");
    assert_eq!(store.reset(), RiskPolicy::default());

    let next = RiskSettingsStore::new(offline_engine(), cache);
    assert_eq!(next.load().await, edited());
}
