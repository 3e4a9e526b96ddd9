//! Session lifecycle integration tests.
//!
//! Sign-in, reload, identity switch, and sign-out against a full dashboard.

use serde_json::json;
use studydash_core::Uid;
use studydash_integration_tests::{participant, Harness};
use studydash_secrets::EphemeralStorage;
use studydash_state::{BindOutcome, RoleFlags, StatePatch, WithdrawalFlags};

#[tokio::test]
async fn test_stores_survive_reload() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    let d = &tab.dashboard;

    d.roles()
        .set(RoleFlags {
            is_parent: true,
            coordinating_center: true,
            help_desk: false,
        })
        .await;
    d.ui_flags()
        .set_active_columns(Some(vec!["token".into(), "firstName".into()]))
        .await;
    d.ui_flags()
        .set_withdrawal_flags(WithdrawalFlags {
            has_prior_participation_status: true,
            has_prior_suspended_contact: false,
        })
        .await;

    let reloaded = tab.reloaded();
    reloaded.dashboard.handle_identity_change(Uid::new("u1")).await;
    assert_eq!(reloaded.dashboard.roles().get(), d.roles().get());
    assert_eq!(reloaded.dashboard.ui_flags().get(), d.ui_flags().get());
    assert!(reloaded.dashboard.roles().get().is_privileged());
}

#[tokio::test]
async fn test_nothing_plaintext_at_rest() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    let d = &tab.dashboard;

    d.participant().set_participant(participant("tok-secret")).await;
    d.stats()
        .record(json!({"verifiedCount": 4242}).as_object().cloned().unwrap())
        .await;
    d.search()
        .set_search_results(json!({"lastName": "Lovelace"}), vec![participant("tok-row")])
        .await;

    for key in tab.storage.keys() {
        assert!(key.starts_with("studydash."), "unexpected key {key}");
        let raw = tab.storage.get_item(&key).unwrap();
        assert!(raw.starts_with("v1."));
        for needle in ["tok-secret", "tok-row", "verifiedCount", "Lovelace"] {
            assert!(!raw.contains(needle), "{key} leaks {needle}");
        }
    }
}

#[tokio::test]
async fn test_store_keys_are_isolated() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    let d = &tab.dashboard;

    d.ui_flags().toggle_filters().await;
    let roles_key = d.roles().storage_key().to_string();
    assert!(tab.storage.get_item(&roles_key).is_none());

    d.roles()
        .set(RoleFlags {
            help_desk: true,
            ..RoleFlags::default()
        })
        .await;
    assert!(d.ui_flags().get().filters_expanded);
    assert!(d.roles().get().help_desk);
    assert_ne!(
        tab.storage.get_item(&roles_key),
        tab.storage.get_item(d.ui_flags().storage_key())
    );
}

#[tokio::test]
async fn test_tampered_store_loads_defaults() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    tab.dashboard.ui_flags().toggle_filters().await;

    let key = tab.dashboard.ui_flags().storage_key().to_string();
    let mut raw = tab.storage.get_item(&key).unwrap();
    raw.truncate(raw.len() - 4);
    raw.push_str("AAAA");
    tab.storage.set_item(&key, &raw);

    let reloaded = tab.reloaded();
    reloaded.dashboard.handle_identity_change(Uid::new("u1")).await;
    assert!(!reloaded.dashboard.ui_flags().get().filters_expanded);
    assert!(tab.storage.get_item(&key).is_none());
}

#[tokio::test]
async fn test_other_uid_sees_defaults() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    tab.dashboard
        .roles()
        .set(RoleFlags {
            coordinating_center: true,
            ..RoleFlags::default()
        })
        .await;

    let other = tab.reloaded();
    other.identity.set_uid(Uid::new("u2"));
    other.dashboard.handle_identity_change(Uid::new("u2")).await;
    assert_eq!(other.dashboard.roles().get(), RoleFlags::default());
}

#[tokio::test]
async fn test_sign_out_resets_and_skips_recovery() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    let d = &tab.dashboard;

    d.roles()
        .set(RoleFlags {
            is_parent: true,
            ..RoleFlags::default()
        })
        .await;
    d.participant().set_participant(participant("tok-1")).await;
    d.search()
        .set_search_results(json!({"predefinedType": "verified"}), vec![participant("tok-1")])
        .await;
    d.app_state()
        .set_state(StatePatch::new().has_unsaved_changes(true));

    tab.sign_out().await;
    assert!(tab.storage.is_empty());
    assert_eq!(d.roles().get(), RoleFlags::default());
    assert!(d.search().get_search_results().is_none());
    assert!(d.search().get_search_metadata().is_none());
    assert!(!d.app_state().has_unsaved_changes());

    tab.sign_in("u1").await;
    assert!(d.participant().get_participant_from_state().await.is_none());
    assert_eq!(tab.lookup.calls(), 0);
}

#[tokio::test]
async fn test_same_uid_relogin_reloads() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    tab.sign_out().await;

    tab.identity.set_uid(Uid::new("u1"));
    let outcome = tab.dashboard.handle_identity_change(Uid::new("u1")).await;
    assert!(matches!(
        outcome,
        Some(BindOutcome::Reloaded { previous: None, .. })
    ));
    assert_eq!(
        tab.dashboard.handle_identity_change(Uid::new("u1")).await,
        Some(BindOutcome::Unchanged)
    );
}

#[tokio::test]
async fn test_role_change_keeps_search_cache() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    let d = &tab.dashboard;

    d.roles()
        .set(RoleFlags {
            coordinating_center: true,
            ..RoleFlags::default()
        })
        .await;
    d.search()
        .set_search_results(json!({"predefinedType": "all"}), vec![participant("tok-1")])
        .await;

    d.roles().set(RoleFlags::default()).await;
    assert!(d.search().has_cached_results());
}

#[tokio::test]
async fn test_clearing_one_store_leaves_others() {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    let d = &tab.dashboard;

    d.roles()
        .set(RoleFlags {
            help_desk: true,
            ..RoleFlags::default()
        })
        .await;
    d.ui_flags().toggle_filters().await;
    d.stats()
        .record(json!({"verifiedCount": 7}).as_object().cloned().unwrap())
        .await;

    let ui_key = d.ui_flags().storage_key().to_string();
    let stats_key = d.stats().storage_key().to_string();
    let ui_raw = tab.storage.get_item(&ui_key);
    let stats_raw = tab.storage.get_item(&stats_key);
    let ui_before = d.ui_flags().get();
    let stats_before = d.stats().get();

    d.roles().clear();
    assert_eq!(d.roles().get(), RoleFlags::default());
    assert!(tab.storage.get_item(d.roles().storage_key()).is_none());

    assert_eq!(d.ui_flags().get(), ui_before);
    assert_eq!(d.stats().get(), stats_before);
    assert_eq!(tab.storage.get_item(&ui_key), ui_raw);
    assert_eq!(tab.storage.get_item(&stats_key), stats_raw);
    assert!(ui_raw.is_some() && stats_raw.is_some());
}
