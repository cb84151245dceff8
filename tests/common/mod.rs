use std::sync::Arc;

use fanstore_rs::{FanStore, MemoryNavigator, Role, User};
use reqwest::Url;

pub const APP_URL: &str = "http://localhost:3000";

/// A client against `base_url` whose navigator starts on `path` of the storefront.
pub fn store_at(base_url: &str, path: &str) -> (FanStore, Arc<MemoryNavigator>) {
    let location = Url::parse(APP_URL).unwrap().join(path).unwrap();
    let navigator = Arc::new(MemoryNavigator::new(location));
    let store = FanStore::new(base_url).with_navigator(navigator.clone());

    (store, navigator)
}

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        username: format!("user{id}"),
        email: format!("user{id}@fanstore.vn"),
        role,
        ..User::default()
    }
}

/// Puts `store` in a signed-in state without talking to the backend.
pub fn sign_in(store: &FanStore, token: &str, user: &User) {
    let tokens = store.token_store();
    tokens.set_access_token(token).unwrap();
    tokens.set_refresh_token("refresh-1").unwrap();
    tokens.set_cached_user(user).unwrap();
    store.auth_store().set_user(Some(user.clone()));
}
