use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fanstore_rs::services::{ListQuery, TagPayload};
use fanstore_rs::session::storage::StorageError;
use fanstore_rs::{
    AuthenticationError, ClientConfig, FanStore, GateDecision, GateRejection, Hydration, MemoryStorage,
    Navigator, RequestError, Role, RoleGate, Storage, UNREACHABLE_MESSAGE,
};
use httpmock::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

mod common;

use common::{sign_in, store_at, user};

#[tokio::test]
async fn bearer_header_matches_stored_token() {
    let server = MockServer::start_async().await;
    let (store, _) = store_at(&server.base_url(), "/");
    store.token_store().set_access_token("abc").unwrap();

    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/brands").header("Authorization", "Bearer abc");
            then.status(200).json_body(json!([]));
        })
        .await;

    store.brands().list(&ListQuery::new()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn no_authorization_header_without_token() {
    let server = MockServer::start_async().await;
    let (store, _) = store_at(&server.base_url(), "/");

    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/tags").matches(|request| {
                !request
                    .headers
                    .iter()
                    .flatten()
                    .any(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            });
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;

    let tags = store.tags().list(&ListQuery::new()).await.unwrap();

    mock.assert_async().await;
    assert!(tags.items.is_empty());
}

#[tokio::test]
async fn rotated_access_token_replaces_stored_one() {
    let server = MockServer::start_async().await;
    let (store, _) = store_at(&server.base_url(), "/");
    store.token_store().set_access_token("old").unwrap();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/colors");
            then.status(200)
                .header("x-new-access-token", "fresh")
                .json_body(json!({ "data": [] }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/tags").header("Authorization", "Bearer fresh");
            then.status(200).json_body(json!([]));
        })
        .await;

    store.colors().list(&ListQuery::new()).await.unwrap();
    assert_eq!(store.token().as_deref(), Some("fresh"));

    store.tags().list(&ListQuery::new()).await.unwrap();
    second.assert_async().await;
}

#[tokio::test]
async fn empty_rotation_header_is_ignored() {
    let server = MockServer::start_async().await;
    let (store, _) = store_at(&server.base_url(), "/");
    store.token_store().set_access_token("kept").unwrap();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/colors");
            then.status(200).header("x-new-access-token", "").json_body(json!([]));
        })
        .await;

    store.colors().list(&ListQuery::new()).await.unwrap();

    assert_eq!(store.token().as_deref(), Some("kept"));
}

#[tokio::test]
async fn unauthorized_ends_session_and_redirects_to_login() {
    let server = MockServer::start_async().await;
    let (store, navigator) = store_at(&server.base_url(), "/admin/brands");
    sign_in(&store, "expired", &user("1", Role::Admin));

    server
        .mock_async(|when, then| {
            when.method(GET).path("/brands");
            then.status(401).json_body(json!({ "message": "jwt expired" }));
        })
        .await;

    let error = store.brands().list(&ListQuery::new()).await.unwrap_err();

    assert!(matches!(error.source, RequestError::Unauthorized));
    assert_eq!(store.token(), None);
    assert_eq!(store.token_store().refresh_token(), None);
    assert_eq!(store.token_store().refresh_cookie(), None);
    assert_eq!(store.token_store().cached_user_raw(), None);
    assert!(!store.auth_store().is_authenticated());
    assert_eq!(
        navigator.last_navigation().unwrap().as_str(),
        "http://localhost:3000/auth/login?message=Your+session+has+expired.+Please+sign+in+again."
    );
}

#[tokio::test]
async fn unauthorized_on_auth_page_does_not_redirect() {
    let server = MockServer::start_async().await;
    let (store, navigator) = store_at(&server.base_url(), "/auth/register");
    sign_in(&store, "expired", &user("1", Role::Customer));

    server
        .mock_async(|when, then| {
            when.method(GET).path("/banners");
            then.status(401);
        })
        .await;

    store.banners().active().await.unwrap_err();

    assert_eq!(store.token(), None);
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn forbidden_keeps_the_session() {
    let server = MockServer::start_async().await;
    let (store, navigator) = store_at(&server.base_url(), "/admin/users");
    sign_in(&store, "valid", &user("3", Role::Staff));

    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/users/9");
            then.status(403).json_body(json!({ "message": "Admins only" }));
        })
        .await;

    let error = store.users().delete("9").await.unwrap_err();

    assert_eq!(error.message, "Admins only");
    assert_eq!(store.token().as_deref(), Some("valid"));
    assert!(store.auth_store().is_authenticated());
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn login_stores_the_session() {
    let server = MockServer::start_async().await;
    let (store, _) = store_at(&server.base_url(), "/admin/login");
    assert_eq!(store.initialize(), Hydration::SignedOut);

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({ "email": "admin@fanstore.vn", "password": "secret" }));
            then.status(200).json_body(json!({
                "data": {
                    "accessToken": "access-1",
                    "refreshToken": "refresh-1",
                    "user": {
                        "id": 7,
                        "username": "admin",
                        "email": "admin@fanstore.vn",
                        "role": "ADMIN",
                        "authProvider": "LOCAL"
                    }
                }
            }));
        })
        .await;

    let session = store.login(" admin@fanstore.vn ", "secret").await.unwrap();

    mock.assert_async().await;
    assert_eq!(session.user.id, "7");
    assert_eq!(store.token().as_deref(), Some("access-1"));
    assert_eq!(store.token_store().refresh_token().as_deref(), Some("refresh-1"));
    assert_eq!(store.token_store().refresh_cookie().as_deref(), Some("refresh-1"));
    assert!(store.auth_store().is_authenticated());

    let decision = RoleGate::admin().resolve(&store).await;
    assert!(decision.is_authorized());
}

#[tokio::test]
async fn login_with_username_and_bad_password() {
    let server = MockServer::start_async().await;
    let (store, navigator) = store_at(&server.base_url(), "/auth/login");

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({ "username": "khach", "password": "wrong" }));
            then.status(401).json_body(json!({ "message": "Bad credentials" }));
        })
        .await;

    let error = store.login("khach", "wrong").await.unwrap_err();

    assert!(matches!(error, AuthenticationError::InvalidCredentials(_)));
    assert_eq!(store.token(), None);
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn login_rejects_empty_fields_locally() {
    let (store, _) = store_at("http://127.0.0.1:1", "/auth/login");

    let error = store.login("  ", "").await.unwrap_err();

    assert!(matches!(
        error,
        AuthenticationError::EmptyField {
            identity: true,
            password: true
        }
    ));
}

#[tokio::test]
async fn logout_clears_session_even_when_backend_fails() {
    let server = MockServer::start_async().await;
    let (store, navigator) = store_at(&server.base_url(), "/account");
    sign_in(&store, "token-1", &user("5", Role::Customer));

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/logout")
                .header("Authorization", "Bearer token-1");
            then.status(500);
        })
        .await;

    store.logout().await;

    mock.assert_async().await;
    assert_eq!(store.token(), None);
    assert_eq!(store.token_store().refresh_token(), None);
    assert!(!store.auth_store().is_authenticated());
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn current_user_refreshes_cache_and_store() {
    let server = MockServer::start_async().await;
    let (store, _) = store_at(&server.base_url(), "/");
    sign_in(&store, "token-1", &user("5", Role::Customer));

    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/me");
            then.status(200).json_body(json!({
                "id": "5",
                "username": "khach",
                "email": "khach@fanstore.vn",
                "address": "12 Lê Lợi"
            }));
        })
        .await;

    let me = store.current_user().await.unwrap();

    assert_eq!(me.address.as_deref(), Some("12 Lê Lợi"));
    assert_eq!(store.auth_store().user(), Some(me));
    assert!(store.token_store().cached_user_raw().unwrap().contains("khach@fanstore.vn"));
}

#[tokio::test]
async fn refresh_session_posts_refresh_token() {
    let server = MockServer::start_async().await;
    let (store, _) = store_at(&server.base_url(), "/");
    sign_in(&store, "token-1", &user("5", Role::Customer));

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/refresh")
                .json_body(json!({ "refreshToken": "refresh-1" }));
            then.status(200).json_body(json!({ "data": { "token": "token-2" } }));
        })
        .await;

    let token = store.refresh_session().await.unwrap();

    mock.assert_async().await;
    assert_eq!(token, "token-2");
    assert_eq!(store.token().as_deref(), Some("token-2"));
    assert_eq!(store.token_store().refresh_token().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn initialize_restores_cached_session_once() {
    let (store, navigator) = store_at("http://127.0.0.1:1", "/staff");
    let admin = user("1", Role::Admin);
    store.token_store().set_access_token("token").unwrap();
    store.token_store().set_cached_user(&admin).unwrap();

    assert_eq!(store.initialize(), Hydration::Restored(admin));
    assert_eq!(store.initialize(), Hydration::AlreadyInitialized);

    let decision = RoleGate::staff().resolve(&store).await;

    let GateDecision::Redirect { location, reason } = decision else {
        panic!("an admin is not staff");
    };
    assert_eq!(
        reason,
        GateRejection::WrongRole {
            required: Role::Staff,
            actual: Role::Admin
        }
    );
    assert_eq!(location.path(), "/");
    assert_eq!(navigator.last_navigation(), Some(location));
}

#[tokio::test]
async fn gate_waits_for_hydration() {
    let (store, navigator) = store_at("http://127.0.0.1:1", "/admin");

    let pending = {
        let store = store.clone();
        tokio::spawn(async move { RoleGate::admin().resolve(&store).await })
    };

    tokio::task::yield_now().await;
    assert!(navigator.history().is_empty());

    store.initialize();
    let decision = pending.await.unwrap();

    let GateDecision::Redirect { location, reason } = decision else {
        panic!("no token is stored");
    };
    assert_eq!(reason, GateRejection::MissingToken);
    assert_eq!(location.path(), "/admin/login");
    assert_eq!(navigator.current().path(), "/admin/login");
}

#[tokio::test]
async fn unreachable_backend_reports_connectivity() {
    let (store, _) = store_at("http://127.0.0.1:1", "/");

    let error = store.brands().list(&ListQuery::new()).await.unwrap_err();

    assert!(error.source.is_network());
    assert_eq!(error.message, UNREACHABLE_MESSAGE);
}

/// A backend that drops its first connection and answers every later one
/// with an empty list. Returns its base URL and the number of accepted connections.
async fn flaky_backend() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let accepted = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            if accepted.fetch_add(1, Ordering::SeqCst) == 0 {
                drop(stream);
                continue;
            }

            let mut buffer = [0_u8; 4096];
            let _ = stream.read(&mut buffer).await;

            let body = r#"{"data":[]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{address}"), connections)
}

#[tokio::test]
async fn read_is_retried_after_dropped_connection() {
    let (base_url, connections) = flaky_backend().await;
    let (store, _) = store_at(&base_url, "/");

    let brands = store.brands().list(&ListQuery::new()).await.unwrap();

    assert!(brands.items.is_empty());
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn write_is_not_retried_after_dropped_connection() {
    let (base_url, connections) = flaky_backend().await;
    let (store, _) = store_at(&base_url, "/admin/tags");

    let error = store.tags().create(&TagPayload::new("Remote")).await.unwrap_err();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(error.source.is_network());
    assert_eq!(connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reads_are_not_retried_when_retries_are_disabled() {
    let (base_url, connections) = flaky_backend().await;
    let store = FanStore::with_config(ClientConfig {
        api_url: base_url,
        query_retries: 0,
        ..ClientConfig::default()
    })
    .unwrap();

    let error = store.brands().list(&ListQuery::new()).await.unwrap_err();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(error.source.is_network());
    assert_eq!(connections.load(Ordering::SeqCst), 1);
}

/// Session storage that starts refusing writes once `lock` is called.
#[derive(Default)]
struct LockableStorage {
    inner: MemoryStorage,
    locked: AtomicBool,
}

impl LockableStorage {
    fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }
}

impl Storage for LockableStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: PathBuf::from("session.json"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key)
    }
}

#[tokio::test]
async fn unwritable_rotation_does_not_hide_the_response() {
    let server = MockServer::start_async().await;
    let storage = Arc::new(LockableStorage::default());
    let (store, _) = store_at(&server.base_url(), "/");
    let store = store.with_storage(storage.clone());
    sign_in(&store, "old", &user("1", Role::Customer));
    storage.lock();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/colors");
            then.status(200)
                .header("x-new-access-token", "fresh")
                .json_body(json!({ "data": [] }));
        })
        .await;

    let colors = store.colors().list(&ListQuery::new()).await.unwrap();

    assert!(colors.items.is_empty());
    assert_eq!(store.token().as_deref(), Some("old"));
}

#[tokio::test]
async fn unwritable_rotation_still_ends_an_expired_session() {
    let server = MockServer::start_async().await;
    let storage = Arc::new(LockableStorage::default());
    let (store, navigator) = store_at(&server.base_url(), "/admin/brands");
    let store = store.with_storage(storage.clone());
    sign_in(&store, "expired", &user("1", Role::Admin));
    storage.lock();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/brands");
            then.status(401).header("x-new-access-token", "fresh");
        })
        .await;

    let error = store.brands().list(&ListQuery::new()).await.unwrap_err();

    assert!(matches!(error.source, RequestError::Unauthorized));
    assert_eq!(store.token(), None);
    assert!(!store.auth_store().is_authenticated());
    assert_eq!(navigator.last_navigation().unwrap().path(), "/auth/login");
}
