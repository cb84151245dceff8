//! Access and refresh tokens, the `refreshToken` cookie and the cached user.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

use super::storage::{Storage, StorageError};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key and cookie name of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the cached user JSON.
pub const USER_KEY: &str = "user";

/// How long the refresh token cookie lives.
pub const REFRESH_COOKIE_MAX_AGE: time::Duration = time::Duration::days(7);

/// Persists the session tokens and the cached user.
///
/// The access token lives in storage only. The refresh token is also mirrored
/// into the client's cookie jar so the backend can read it. Nothing is
/// encrypted and nothing is validated: this is storage only.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
    jar: Arc<Jar>,
    cookie_url: Url,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("cookie_url", &self.cookie_url.as_str())
            .field("has_access_token", &self.access_token().is_some())
            .field("has_refresh_token", &self.refresh_token().is_some())
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Creates a store writing to `storage` and mirroring cookies for `cookie_url` into `jar`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, jar: Arc<Jar>, cookie_url: Url) -> Self {
        Self {
            storage,
            jar,
            cookie_url,
        }
    }

    /// The same cookie jar and URL over another storage.
    #[must_use]
    pub(crate) fn with_storage(&self, storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            jar: Arc::clone(&self.jar),
            cookie_url: self.cookie_url.clone(),
        }
    }

    /// The stored access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        non_empty(self.storage.get_item(ACCESS_TOKEN_KEY))
    }

    /// Stores the access token.
    pub fn set_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set_item(ACCESS_TOKEN_KEY, token)
    }

    /// Removes the access token.
    pub fn clear_access_token(&self) -> Result<(), StorageError> {
        self.storage.remove_item(ACCESS_TOKEN_KEY)
    }

    /// The stored refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        non_empty(self.storage.get_item(REFRESH_TOKEN_KEY))
    }

    /// Stores the refresh token and mirrors it into the `refreshToken` cookie.
    pub fn set_refresh_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set_item(REFRESH_TOKEN_KEY, token)?;

        let cookie = format!(
            "{REFRESH_TOKEN_KEY}={token}; Path=/; Max-Age={}; SameSite=Lax{}",
            REFRESH_COOKIE_MAX_AGE.whole_seconds(),
            if self.is_secure() { "; Secure" } else { "" }
        );
        self.jar.add_cookie_str(&cookie, &self.cookie_url);

        Ok(())
    }

    /// Removes the refresh token and expires its cookie.
    pub fn clear_refresh_token(&self) -> Result<(), StorageError> {
        self.storage.remove_item(REFRESH_TOKEN_KEY)?;

        let expired = format!(
            "{REFRESH_TOKEN_KEY}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Lax"
        );
        self.jar.add_cookie_str(&expired, &self.cookie_url);

        Ok(())
    }

    /// The `refreshToken` cookie value the jar would send to the backend.
    #[must_use]
    pub fn refresh_cookie(&self) -> Option<String> {
        let header = self.jar.cookies(&self.cookie_url)?;
        let header = header.to_str().ok()?;

        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == REFRESH_TOKEN_KEY)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    /// The raw cached user JSON, if any.
    #[must_use]
    pub fn cached_user_raw(&self) -> Option<String> {
        non_empty(self.storage.get_item(USER_KEY))
    }

    /// Caches the user as JSON.
    pub fn set_cached_user<T: serde::Serialize>(&self, user: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(user).map_err(|source| StorageError::Corrupted {
            path: USER_KEY.into(),
            source,
        })?;

        self.storage.set_item(USER_KEY, &json)
    }

    /// Drops the cached user.
    pub fn clear_cached_user(&self) -> Result<(), StorageError> {
        self.storage.remove_item(USER_KEY)
    }

    /// Removes both tokens, the refresh cookie and the cached user.
    ///
    /// Every removal is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let results = [
            self.clear_access_token(),
            self.clear_refresh_token(),
            self.clear_cached_user(),
        ];

        results.into_iter().collect()
    }

    fn is_secure(&self) -> bool {
        self.cookie_url.scheme() == "https"
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
