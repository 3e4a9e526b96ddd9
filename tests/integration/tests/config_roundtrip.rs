//! Config save/load roundtrip integration tests.
//!
//! These tests verify that the state config can be written to disk, loaded
//! back, and used to build a working dashboard.

use std::path::Path;
use std::sync::Arc;

use studydash_core::config::StateConfigBuilder;
use studydash_core::StateConfig;
use studydash_integration_tests::{participant, Harness};
use studydash_secrets::crypto::generate_app_key;
use studydash_secrets::{AesGcmCryptoProvider, EphemeralStorage, MemoryStorage};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json5");

    let config = StateConfigBuilder::new()
        .namespace("trial42")
        .stats_ttl_secs(60)
        .max_cached_results(2)
        .build();
    config.save(&path).unwrap();

    let loaded = StateConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_load_nonexistent() {
    let result = StateConfig::load(Path::new("/nonexistent/state.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(StateConfig::parse("not valid json").is_err());
}

#[tokio::test]
async fn test_loaded_config_drives_dashboard() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json5");
    std::fs::write(
        &path,
        "{ storage: { namespace: 'trial42' }, search: { max_cached_results: 2 } }",
    )
    .unwrap();
    let config = StateConfig::load(&path).unwrap();

    let crypto = Arc::new(AesGcmCryptoProvider::new(generate_app_key().to_vec()).unwrap());
    let tab = Harness::with_crypto(config, crypto, Arc::new(MemoryStorage::new()));
    tab.sign_in("u1").await;

    tab.dashboard
        .search()
        .set_search_results(
            serde_json::json!({"predefinedType": "all"}),
            vec![participant("a"), participant("b"), participant("c")],
        )
        .await;
    assert_eq!(tab.dashboard.search().get_search_results().unwrap().len(), 2);
    assert_eq!(tab.storage.keys(), vec!["trial42.searchState.metadata"]);
}
