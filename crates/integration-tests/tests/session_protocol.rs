//! End-to-end tests of the session lifecycle: bootstrap, login, logout, and
//! the gateway's one-shot refresh-and-retry protocol.
//!
//! Each test spins up its own in-process mock backend, so assertions about
//! refresh counts and request counts are exact.

use std::sync::Arc;

use secrecy::SecretString;
use uuid::Uuid;

use pantry_client::store::{MemoryTokenStore, TokenPair, TokenStore};
use pantry_client::{ApiError, Storefront};
use pantry_integration_tests::{MockApi, TEST_OTP};

const PASSWORD: &str = "correct-horse-battery";

fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", Uuid::new_v4())
}

fn password() -> SecretString {
    SecretString::from(PASSWORD)
}

fn storefront(api: &MockApi, store: Arc<MemoryTokenStore>) -> Storefront {
    Storefront::new(&api.client_config(), store).expect("storefront wires up")
}

// ============================================================================
// Login / bootstrap equivalence
// ============================================================================

#[tokio::test]
async fn test_login_then_bootstrap_resolves_same_user() {
    let api = MockApi::spawn().await;
    let email = unique_email("dana");
    api.seed_user("Dana", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let first = storefront(&api, store.clone());
    first.bootstrap().await.expect("empty bootstrap");
    let signed_in = first.sign_in(&email, &password()).await.expect("sign in");

    // A second storefront over the same durable store models a fresh
    // process restart.
    let second = storefront(&api, store);
    second.bootstrap().await.expect("bootstrap");

    let restored = second
        .session()
        .current_user()
        .expect("session restored from stored tokens");
    assert_eq!(restored, signed_in);
    assert!(!second.session().is_loading());
}

#[tokio::test]
async fn test_bootstrap_runs_once_per_process() {
    let api = MockApi::spawn().await;
    let email = unique_email("once");
    api.seed_user("Once", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store);
    shop.sign_in(&email, &password()).await.expect("sign in");

    shop.session().bootstrap().await;
    let requests_after_first = api.request_count();

    // Later calls are no-ops: no further network traffic.
    shop.session().bootstrap().await;
    assert_eq!(api.request_count(), requests_after_first);
}

#[tokio::test]
async fn test_bootstrap_with_stale_tokens_clears_them() {
    let api = MockApi::spawn().await;
    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(&TokenPair::new(
            "long-gone-access".to_string(),
            "long-gone-refresh".to_string(),
        ))
        .expect("seed stale tokens");

    let shop = storefront(&api, store.clone());
    shop.bootstrap().await.expect("bootstrap swallows staleness");

    // A stale token is the same as never having signed in.
    assert!(store.load().expect("store readable").is_none());
    assert!(!shop.session().is_authenticated());
    assert!(!shop.session().is_loading());
}

// ============================================================================
// Signup / verification flow
// ============================================================================

#[tokio::test]
async fn test_signup_verify_signin_flow() {
    let api = MockApi::spawn().await;
    let email = unique_email("avery");
    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store);

    shop.sign_up("Avery", &email, Some("555-0100"), &password())
        .await
        .expect("signup");

    // Unverified accounts cannot sign in; the server's message is surfaced.
    let err = shop
        .sign_in(&email, &password())
        .await
        .expect_err("unverified sign-in must fail");
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "account not verified");
        }
        other => panic!("unexpected error: {other}"),
    }

    shop.resend_otp(&email).await.expect("resend code");

    let err = shop
        .verify_otp(&email, "999999")
        .await
        .expect_err("wrong code must fail");
    assert!(matches!(err, ApiError::Api { status: 400, .. }));

    shop.verify_otp(&email, TEST_OTP).await.expect("verify");
    let profile = shop.sign_in(&email, &password()).await.expect("sign in");
    assert!(profile.is_verified);
    assert!(shop.session().is_authenticated());
}

#[tokio::test]
async fn test_wrong_password_leaves_session_signed_out() {
    let api = MockApi::spawn().await;
    let email = unique_email("mallory");
    api.seed_user("Mallory", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store.clone());

    let err = shop
        .sign_in(&email, &SecretString::from("not-the-password"))
        .await
        .expect_err("wrong password must fail");
    assert!(matches!(err, ApiError::Api { status: 401, .. }));

    assert!(shop.session().current_user().is_none());
    assert!(!shop.session().is_authenticated());
    assert!(store.load().expect("store readable").is_none());
}

#[tokio::test]
async fn test_login_failure_keeps_just_written_tokens() {
    let api = MockApi::spawn().await;
    let email = unique_email("flaky");
    api.seed_user("Flaky", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store.clone());

    // Credential exchange succeeds, identity resolution then breaks.
    api.fail_next_me(500);
    let err = shop
        .sign_in(&email, &password())
        .await
        .expect_err("resolution failure propagates");
    assert!(matches!(err, ApiError::Api { status: 500, .. }));

    // Unlike bootstrap, login leaves the freshly written pair in place; the
    // caller decides whether to retry or clear.
    assert!(store.load().expect("store readable").is_some());
    assert!(!shop.session().is_authenticated());
}

// ============================================================================
// Refresh-and-retry protocol
// ============================================================================

#[tokio::test]
async fn test_expired_access_token_is_refreshed_transparently() {
    let api = MockApi::spawn().await;
    let email = unique_email("refresh");
    api.seed_user("Refresh", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store.clone());
    shop.sign_in(&email, &password()).await.expect("sign in");
    let original = store
        .load()
        .expect("store readable")
        .expect("tokens stored");

    api.revoke_access_tokens();

    let profile = shop
        .api()
        .fetch_profile()
        .await
        .expect("request succeeds after transparent refresh");
    assert_eq!(profile.email.as_str(), email);
    assert_eq!(api.refresh_calls(), 1);

    // The rotated pair was persisted.
    let rotated = store
        .load()
        .expect("store readable")
        .expect("tokens still stored");
    assert_ne!(rotated, original);
}

#[tokio::test]
async fn test_second_authorization_failure_is_terminal() {
    let api = MockApi::spawn().await;
    let email = unique_email("terminal");
    api.seed_user("Terminal", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store.clone());
    shop.sign_in(&email, &password()).await.expect("sign in");

    // The refresh itself "succeeds" but mints an unusable access token, so
    // the replayed request is rejected again.
    api.set_mint_unusable_access(true);
    api.revoke_access_tokens();

    let err = shop
        .api()
        .fetch_profile()
        .await
        .expect_err("second authorization failure is terminal");
    assert!(matches!(err, ApiError::Unauthorized));

    // Exactly one refresh attempt: the replayed request must not re-enter
    // the refresh cycle.
    assert_eq!(api.refresh_calls(), 1);

    // Terminal failure clears durable storage and drops the user.
    assert!(store.load().expect("store readable").is_none());
    assert!(!shop.session().is_authenticated());
}

#[tokio::test]
async fn test_refresh_rejection_clears_session() {
    let api = MockApi::spawn().await;
    let email = unique_email("revoked");
    api.seed_user("Revoked", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store.clone());
    shop.sign_in(&email, &password()).await.expect("sign in");

    api.revoke_all_tokens();

    let err = shop
        .api()
        .fetch_profile()
        .await
        .expect_err("refresh rejection is terminal");
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(api.refresh_calls(), 1);
    assert!(store.load().expect("store readable").is_none());
    assert!(!shop.session().is_authenticated());
}

#[tokio::test]
async fn test_missing_refresh_token_fails_without_refresh_call() {
    let api = MockApi::spawn().await;
    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store);

    // No session at all: the 401 cannot be recovered and the refresh
    // endpoint is never consulted.
    let err = shop
        .api()
        .fetch_profile()
        .await
        .expect_err("no session to refresh");
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(api.refresh_calls(), 0);
}

#[tokio::test]
async fn test_session_expiry_is_published_to_subscribers() {
    let api = MockApi::spawn().await;
    let email = unique_email("watcher");
    api.seed_user("Watcher", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store);
    shop.sign_in(&email, &password()).await.expect("sign in");

    let mut rx = shop.session().subscribe();
    rx.mark_unchanged();

    api.revoke_all_tokens();
    let _ = shop.api().fetch_profile().await;

    rx.changed().await.expect("session cell still alive");
    assert!(rx.borrow().current_user.is_none());
}

// ============================================================================
// Logout / profile replacement
// ============================================================================

#[tokio::test]
async fn test_logout_is_local_and_immediate() {
    let api = MockApi::spawn().await;
    let email = unique_email("leaver");
    api.seed_user("Leaver", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store.clone());
    shop.sign_in(&email, &password()).await.expect("sign in");

    let requests_before = api.request_count();
    shop.sign_out().expect("sign out");

    assert!(!shop.session().is_authenticated());
    assert!(store.load().expect("store readable").is_none());
    // Logout has no network effect.
    assert_eq!(api.request_count(), requests_before);
}

#[tokio::test]
async fn test_update_user_replaces_profile_wholesale() {
    let api = MockApi::spawn().await;
    let email = unique_email("editor");
    api.seed_user("Editor", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop = storefront(&api, store);
    shop.sign_in(&email, &password()).await.expect("sign in");

    let mut edited = shop.session().current_user().expect("signed in");
    edited.name = "Renamed Editor".to_string();
    shop.session().update_user(edited.clone());

    assert_eq!(shop.session().current_user(), Some(edited));
}
