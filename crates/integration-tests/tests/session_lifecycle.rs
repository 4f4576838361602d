//! Session hydration, login, logout, and refresh against the mock backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use onlineshop_core::Role;
use onlineshop_integration_tests::MockBackend;
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::api::CreateOrderRequest;
use onlineshop_storefront::session::{AuthError, StaleCredentialPolicy};
use onlineshop_storefront::storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use rust_decimal::Decimal;
use secrecy::SecretString;

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

// ============================================================================
// Hydration
// ============================================================================

#[tokio::test]
async fn test_hydrate_restores_persisted_session() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
    store.save(&backend.credentials_for(ayse)).unwrap();

    let context = backend.context(store);
    assert!(context.session().snapshot().loading);

    let snapshot = context.session().hydrate().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.user.unwrap().id, ayse);
    assert_eq!(backend.hits("GET", &format!("/customers/{ayse}")), 1);
}

#[tokio::test]
async fn test_hydrate_without_credentials_makes_no_requests() {
    let backend = MockBackend::start().await;
    let context = backend.context(Arc::new(MemoryCredentialStore::new()));

    let snapshot = context.session().hydrate().await;
    assert!(!snapshot.loading);
    assert!(snapshot.user.is_none());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_hydrate_runs_once() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    let context = backend.context(store);

    let (first, second) = tokio::join!(context.session().hydrate(), context.session().hydrate());
    assert_eq!(first, second);
    context.session().hydrate().await;

    assert_eq!(backend.hits("GET", &format!("/customers/{ayse}")), 1);
}

#[tokio::test]
async fn test_rejected_credentials_are_kept_by_default() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    backend.revoke_tokens();

    let context = backend.context(store.clone());
    let snapshot = context.session().hydrate().await;

    assert!(snapshot.user.is_none());
    assert!(!snapshot.loading);
    assert!(store.load().unwrap().is_some());
}

#[tokio::test]
async fn test_rejected_credentials_cleared_when_configured() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    backend.revoke_tokens();

    let mut config = backend.config("/nonexistent/credentials.json");
    config.stale_credentials = StaleCredentialPolicy::ClearOnUnauthorized;
    let context = ShopContext::with_store(config, store.clone()).unwrap();

    assert!(context.session().hydrate().await.user.is_none());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_server_error_during_hydration_never_clears() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    backend.fail_customer_lookups(Some(500));

    let mut config = backend.config("/nonexistent/credentials.json");
    config.stale_credentials = StaleCredentialPolicy::ClearOnUnauthorized;
    let context = ShopContext::with_store(config, store.clone()).unwrap();

    assert!(context.session().hydrate().await.user.is_none());
    assert!(store.load().unwrap().is_some());
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_persists_credentials_and_publishes_user() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Admin);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    let store = Arc::new(FileCredentialStore::new(&path));
    let context = backend.context(store);
    let mut updates = context.session().subscribe();

    let user = context.session().login("ayse", &password("secret")).await.unwrap();
    assert_eq!(user.id, ayse);
    assert!(user.is_admin());

    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.user.unwrap().id, ayse);
    assert!(!snapshot.loading);

    // A fresh process restores the same session from disk
    let restored = backend.context(Arc::new(FileCredentialStore::new(&path)));
    let snapshot = restored.session().hydrate().await;
    assert_eq!(snapshot.user.unwrap().username, "ayse");
}

#[tokio::test]
async fn test_failed_login_leaves_session_untouched() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    backend.add_user("can", "hunter2", Role::Customer);

    let store = Arc::new(MemoryCredentialStore::new());
    let context = backend.context(store.clone());
    context.session().login("ayse", &password("secret")).await.unwrap();

    let err = context
        .session()
        .login("can", &password("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Authentication { .. }));
    assert_eq!(err.to_string(), "Invalid username or password");
    assert_eq!(err.envelope().status, Some(401));

    assert_eq!(context.session().current_user().unwrap().id, ayse);
    assert_eq!(store.load().unwrap().unwrap().user_id(), ayse);
}

#[tokio::test]
async fn test_login_not_persisted_when_user_fetch_fails() {
    let backend = MockBackend::start().await;
    backend.add_user("ayse", "secret", Role::Customer);
    backend.fail_customer_lookups(Some(503));

    let store = Arc::new(MemoryCredentialStore::new());
    let context = backend.context(store.clone());

    let err = context
        .session()
        .login("ayse", &password("secret"))
        .await
        .unwrap_err();
    assert_eq!(err.envelope().status, Some(503));
    assert!(store.load().unwrap().is_none());
    assert!(context.session().current_user().is_none());
}

#[tokio::test]
async fn test_login_sends_no_bearer_token() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    let context = backend.context(store);

    context.session().login("ayse", &password("secret")).await.unwrap();

    let request = backend.last_request("/auth/login").unwrap();
    assert_eq!(request.method, "POST");
    assert!(request.authorization.is_none());
}

// ============================================================================
// Logout & Refresh
// ============================================================================

#[tokio::test]
async fn test_logout_clears_credentials_and_user() {
    let backend = MockBackend::start().await;
    backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::new());
    let context = backend.context(store.clone());

    context.session().login("ayse", &password("secret")).await.unwrap();
    context.session().logout().await;

    assert!(context.session().current_user().is_none());
    assert!(store.load().unwrap().is_none());

    // Later requests go out unauthenticated
    context.api().list_products().await.unwrap();
    assert!(backend.last_request("/products").unwrap().authorization.is_none());
}

#[tokio::test]
async fn test_logout_makes_later_hydrate_a_no_op() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    let context = backend.context(store);

    context.session().logout().await;
    let snapshot = context.session().hydrate().await;

    assert!(snapshot.user.is_none());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_refresh_picks_up_new_orders() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let mug = backend.add_product("Mug", Decimal::new(999, 2), true);
    let context = backend.context(Arc::new(MemoryCredentialStore::new()));

    let user = context.session().login("ayse", &password("secret")).await.unwrap();
    assert!(user.orders.is_empty());

    context
        .api()
        .buy(CreateOrderRequest {
            customer_id: ayse,
            product_id: mug,
        })
        .await
        .unwrap();

    let snapshot = context.session().refresh().await;
    let orders = snapshot.user.unwrap().orders;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].product.as_ref().unwrap().name, "Mug");
}

#[tokio::test]
async fn test_refresh_failure_keeps_current_user() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::new());
    let context = backend.context(store.clone());
    context.session().login("ayse", &password("secret")).await.unwrap();

    backend.fail_customer_lookups(Some(401));
    let snapshot = context.session().refresh().await;

    assert_eq!(snapshot.user.unwrap().id, ayse);
    assert!(store.load().unwrap().is_some());
}

#[tokio::test]
async fn test_refresh_without_credentials_does_nothing() {
    let backend = MockBackend::start().await;
    let context = backend.context(Arc::new(MemoryCredentialStore::new()));
    context.session().hydrate().await;

    let snapshot = context.session().refresh().await;
    assert!(snapshot.user.is_none());
    assert!(backend.requests().is_empty());
}
