//! One-shot startup check reconciling the persisted session with the auth store.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use super::auth_store::AuthStore;
use super::token_store::TokenStore;
use super::user::User;

/// Reconciles the persisted session with the [`AuthStore`] once per application load.
///
/// Only the first call to [`AuthProvider::initialize`] does anything; later
/// calls return immediately.
#[derive(Debug, Default)]
pub struct AuthProvider {
    initialized: AtomicBool,
}

/// What the startup check concluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hydration {
    /// A stored token and a usable cached user were found.
    Restored(User),
    /// Token or cached user missing.
    SignedOut,
    /// Both were stored but the cached user had no identifier or did not decode.
    Discarded,
    /// An earlier call already ran the check.
    AlreadyInitialized,
}

impl AuthProvider {
    /// Creates a provider that has not run yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether the check already ran.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Runs the startup session check, then marks the store as hydrated.
    pub fn initialize(&self, tokens: &TokenStore, store: &AuthStore) -> Hydration {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Hydration::AlreadyInitialized;
        }

        let outcome = restore(tokens, store);
        store.set_has_hydrated(true);

        match &outcome {
            Hydration::Restored(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "session restored");
            }
            Hydration::Discarded => tracing::warn!("cached user unusable, session discarded"),
            _ => tracing::debug!("no stored session"),
        }

        outcome
    }
}

fn restore(tokens: &TokenStore, store: &AuthStore) -> Hydration {
    let (Some(_token), Some(raw_user)) = (tokens.access_token(), tokens.cached_user_raw()) else {
        store.clear_auth();
        return Hydration::SignedOut;
    };

    let user = serde_json::from_str::<Value>(&raw_user)
        .ok()
        .filter(has_identifier)
        .and_then(|value| serde_json::from_value::<User>(value).ok());

    if let Some(user) = user {
        store.set_user(Some(user.clone()));
        return Hydration::Restored(user);
    }

    store.clear_auth();
    if let Err(error) = tokens.clear_cached_user() {
        tracing::warn!(%error, "could not drop unusable cached user");
    }

    Hydration::Discarded
}

fn has_identifier(value: &Value) -> bool {
    match value.get("id") {
        Some(Value::String(id)) => !id.is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::cookie::Jar;
    use reqwest::Url;

    use super::*;
    use crate::session::storage::MemoryStorage;
    use crate::session::user::Role;

    fn tokens() -> TokenStore {
        TokenStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(Jar::default()),
            Url::parse("http://localhost:8080").unwrap(),
        )
    }

    const CACHED_USER: &str =
        r#"{"id":"u1","username":"hoa","email":"hoa@example.com","role":"ADMIN","authProvider":"LOCAL"}"#;

    #[test]
    fn restores_token_and_user() {
        let tokens = tokens();
        tokens.set_access_token("t").unwrap();
        tokens.set_cached_user(&serde_json::from_str::<Value>(CACHED_USER).unwrap()).unwrap();
        let store = AuthStore::new();

        let outcome = AuthProvider::new().initialize(&tokens, &store);

        assert!(matches!(outcome, Hydration::Restored(ref user) if user.id == "u1"));
        let state = store.state();
        assert!(state.is_authenticated);
        assert!(state.has_hydrated);
    }

    #[test]
    fn missing_token_signs_out() {
        let tokens = tokens();
        tokens.set_cached_user(&serde_json::from_str::<Value>(CACHED_USER).unwrap()).unwrap();
        let store = AuthStore::new();

        let outcome = AuthProvider::new().initialize(&tokens, &store);

        assert_eq!(outcome, Hydration::SignedOut);
        assert!(!store.is_authenticated());
        assert!(store.has_hydrated());
    }

    #[test]
    fn partial_user_with_identifier_is_restored() {
        let tokens = tokens();
        tokens.set_access_token("t").unwrap();
        tokens.set_cached_user(&serde_json::json!({ "id": "u1", "role": "ADMIN" })).unwrap();
        let store = AuthStore::new();

        let outcome = AuthProvider::new().initialize(&tokens, &store);

        let Hydration::Restored(user) = outcome else {
            panic!("a cached user with an id is usable");
        };
        assert_eq!(user.id, "u1");
        assert_eq!(user.role, Role::Admin);
        assert!(user.username.is_empty());
        assert!(store.is_authenticated());
        assert!(tokens.cached_user_raw().is_some());
    }

    #[test]
    fn user_without_identifier_is_discarded() {
        let tokens = tokens();
        tokens.set_access_token("t").unwrap();
        tokens.set_cached_user(&serde_json::json!({ "username": "ghost" })).unwrap();
        let store = AuthStore::new();

        let outcome = AuthProvider::new().initialize(&tokens, &store);

        assert_eq!(outcome, Hydration::Discarded);
        assert!(!store.is_authenticated());
        assert!(store.has_hydrated());
        assert_eq!(tokens.cached_user_raw(), None);
    }

    #[test]
    fn runs_only_once() {
        let tokens = tokens();
        let store = AuthStore::new();
        let provider = AuthProvider::new();

        assert_eq!(provider.initialize(&tokens, &store), Hydration::SignedOut);

        tokens.set_access_token("t").unwrap();
        tokens.set_cached_user(&serde_json::from_str::<Value>(CACHED_USER).unwrap()).unwrap();

        assert_eq!(provider.initialize(&tokens, &store), Hydration::AlreadyInitialized);
        assert!(!store.is_authenticated());
    }
}
