//! Participant recovery integration tests.
//!
//! A participant is set in one tab, the tab reloads, and the record is
//! rebuilt from the persisted token through the lookup.

use std::sync::Arc;

use studydash_core::Uid;
use studydash_integration_tests::{participant, Harness};
use studydash_secrets::EphemeralStorage;
use studydash_state::{LookupError, LookupResponse};

async fn reloaded_with_token() -> (Harness, Harness) {
    let tab = Harness::new();
    tab.sign_in("u1").await;
    tab.dashboard
        .participant()
        .set_participant(participant("tok-1"))
        .await;

    let reloaded = tab.reloaded();
    reloaded.dashboard.handle_identity_change(Uid::new("u1")).await;
    (tab, reloaded)
}

#[tokio::test]
async fn test_recovery_after_reload() {
    let (_tab, reloaded) = reloaded_with_token().await;
    let session = reloaded.dashboard.participant();
    assert!(session.get_participant().is_none());

    let recovered = session.get_participant_from_state().await.unwrap();
    assert_eq!(recovered.token(), Some("tok-1"));
    assert_eq!(session.get_participant(), Some(recovered));
    assert_eq!(reloaded.lookup.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_lookup() {
    let (_tab, reloaded) = reloaded_with_token().await;
    let reloaded = Arc::new(reloaded);
    reloaded.lookup.set_gated(true);

    let mut callers = Vec::new();
    callers.push(tokio::spawn({
        let h = reloaded.clone();
        async move { h.dashboard.participant().recover_participant_from_session().await }
    }));
    reloaded.lookup.wait_for_call().await;

    for _ in 0..9 {
        let h = reloaded.clone();
        callers.push(tokio::spawn(async move {
            h.dashboard.participant().recover_participant_from_session().await
        }));
    }
    // Every joiner must reach the in-flight slot before the lookup settles.
    while !reloaded.dashboard.participant().recovery_in_flight() {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    reloaded.lookup.release();

    for caller in callers {
        let result = caller.await.unwrap();
        assert_eq!(result.unwrap().token(), Some("tok-1"));
    }
    assert_eq!(reloaded.lookup.calls(), 1);
    assert!(!reloaded.dashboard.participant().recovery_in_flight());
}

#[tokio::test]
async fn test_not_found_removes_token() {
    let (tab, reloaded) = reloaded_with_token().await;
    reloaded
        .lookup
        .set_response(Ok(LookupResponse::ok(Vec::new())));
    let session = reloaded.dashboard.participant();

    assert!(session.recover_participant_from_session().await.is_none());
    assert!(session.get_participant_token().await.is_none());
    assert!(tab
        .storage
        .get_item("studydash.participantState.token")
        .is_none());

    // Nothing left to recover, so no further lookups.
    assert!(session.get_participant_from_state().await.is_none());
    assert_eq!(reloaded.lookup.calls(), 1);
}

#[tokio::test]
async fn test_ambiguous_match_is_not_found() {
    let (_tab, reloaded) = reloaded_with_token().await;
    reloaded.lookup.set_response(Ok(LookupResponse::ok(vec![
        serde_json::json!({"token": "tok-1"}),
        serde_json::json!({"token": "tok-1"}),
    ])));
    let session = reloaded.dashboard.participant();

    assert!(session.recover_participant_from_session().await.is_none());
    assert!(session.get_participant_token().await.is_none());
}

#[tokio::test]
async fn test_transport_error_keeps_token_for_retry() {
    let (_tab, reloaded) = reloaded_with_token().await;
    reloaded
        .lookup
        .set_response(Err(LookupError::Transport("timed out".into())));
    let session = reloaded.dashboard.participant();

    assert!(session.recover_participant_from_session().await.is_none());
    assert_eq!(
        session.get_participant_token().await.unwrap().expose_secret(),
        "tok-1"
    );

    reloaded.lookup.set_response(Ok(LookupResponse::ok(vec![
        serde_json::json!({"token": "tok-1", "firstName": "Ada"}),
    ])));
    let recovered = session.get_participant_from_state().await.unwrap();
    assert_eq!(recovered.token(), Some("tok-1"));
    assert_eq!(reloaded.lookup.calls(), 2);
}

#[tokio::test]
async fn test_token_opaque_to_other_uid() {
    let (tab, _reloaded) = reloaded_with_token().await;

    let other = tab.reloaded();
    other.identity.set_uid(Uid::new("u2"));
    assert!(other
        .dashboard
        .participant()
        .get_participant_token()
        .await
        .is_none());
    assert!(other
        .dashboard
        .participant()
        .get_participant_from_state()
        .await
        .is_none());
    assert_eq!(other.lookup.calls(), 0);
    assert!(tab
        .storage
        .get_item("studydash.participantState.token")
        .is_some());

    // The owner can still recover after the other uid looked.
    let owner = tab.reloaded();
    owner.identity.set_uid(Uid::new("u1"));
    let recovered = owner.dashboard.participant().get_participant_from_state().await;
    assert_eq!(recovered.unwrap().token(), Some("tok-1"));
}
