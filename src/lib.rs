//! `fanstore-rs` is a Rust client for the fan storefront REST API.
//!
//! It carries the whole client-side session lifecycle: tokens persisted in a
//! [`Storage`], an observable [`AuthStore`], a one-shot [`AuthProvider`] run at
//! startup, [`RoleGate`]s for the admin and staff areas, and typed services
//! for banners, brands, categories, colors, tags, users, chat and payments.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::error::Error;
//!
//! use fanstore_rs::services::ListQuery;
//! use fanstore_rs::{FanStore, RoleGate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     let store = FanStore::new("http://localhost:8080/api");
//!     store.initialize();
//!
//!     store.login("admin@fanstore.vn", "YOUR_PASSWORD").await?;
//!
//!     if RoleGate::admin().resolve(&store).await.is_authorized() {
//!         let brands = store.brands().list(&ListQuery::new().search("pana")).await?;
//!
//!         for brand in brands.items {
//!             println!("{}", brand.name);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

pub use config::{ClientConfig, ConfigError};
pub use error::*;
pub use resource::{Resource, RecordList};
use reqwest::cookie::Jar;
use reqwest::{RequestBuilder, Response, Url};
pub use reqwest::multipart::{Form, Part};
use serde::Serialize;
pub use session::auth::{AuthenticationError, LoginResponse, RegisterPayload};
pub use session::auth_provider::{AuthProvider, Hydration};
pub use session::auth_store::{AuthState, AuthStore};
pub use session::guard::{GateDecision, GateMessages, GateRejection, RoleGate};
pub use session::navigator::{MemoryNavigator, Navigator};
pub use session::storage::{FileStorage, MemoryStorage, Storage};
pub use session::token_store::TokenStore;
pub use session::user::{LoginProvider, Role, User};

pub mod config;
pub mod error;
pub mod resource;
pub mod services;
pub mod session;

/// Response header carrying a rotated access token.
pub const NEW_ACCESS_TOKEN_HEADER: &str = "x-new-access-token";

/// Reason shown on the login page after the backend rejected the session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// A client for the storefront backend.
///
/// Cloning is cheap and every clone shares the same token store, auth store,
/// navigator and connection pool.
///
/// The `Debug` implementation for this struct redacts sensitive authentication data
/// to prevent accidental exposure in logs.
///
/// # Example
/// ```rust,ignore
/// let store = FanStore::new("http://localhost:8080/api");
///
/// let banners = store.banners().active().await?;
/// ```
#[derive(Clone)]
pub struct FanStore {
    pub(crate) base_url: String,
    pub(crate) api_url: Url,
    pub(crate) app_url: Url,
    pub(crate) tokens: TokenStore,
    pub(crate) auth_store: AuthStore,
    pub(crate) auth_provider: Arc<AuthProvider>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) reqwest_client: reqwest::Client,
    pub(crate) query_retries: u8,
}

impl std::fmt::Debug for FanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanStore")
            .field("base_url", &self.base_url)
            .field("app_url", &self.app_url.as_str())
            .field(
                "access_token",
                &self.tokens.access_token().map(|_| "***REDACTED***"),
            )
            .field("auth_state", &self.auth_store.state())
            .field("reqwest_client", &"Client")
            .finish_non_exhaustive()
    }
}

impl FanStore {
    /// Creates a client for `base_url` with an in-memory session and default settings.
    ///
    /// # Example
    /// ```rust,ignore
    /// let store = FanStore::new("http://localhost:8080/api");
    /// ```
    /// # Panics
    ///
    /// This method will panic if the provided `base_url` is not a valid URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let config = ClientConfig {
            api_url: base_url.to_string(),
            ..ClientConfig::default()
        };

        match Self::with_config(config) {
            Ok(client) => client,
            Err(error) => panic!("Invalid base_url: {error}"),
        }
    }

    /// Creates a client from `config`.
    ///
    /// Opens the file-backed session when `storage_path` is set.
    pub fn with_config(config: ClientConfig) -> Result<Self, ConfigError> {
        let api_url = config::normalize_url("api_url", &config.api_url)?;
        let app_url = config::normalize_url("app_url", &config.app_url)?;

        let storage: Arc<dyn Storage> = match &config.storage_path {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };

        let jar = Arc::new(Jar::default());

        let reqwest_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        let navigator = Arc::new(MemoryNavigator::new(app_url.clone()));

        Ok(Self {
            base_url: config.api_url.trim().trim_end_matches('/').to_string(),
            tokens: TokenStore::new(storage, jar, api_url.clone()),
            api_url,
            app_url,
            auth_store: AuthStore::new(),
            auth_provider: Arc::new(AuthProvider::new()),
            navigator,
            reqwest_client,
            query_retries: config.query_retries,
        })
    }

    /// Uses `navigator` for session-expiry and gate redirects.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Persists the session in `storage` instead of the configured one.
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.tokens = self.tokens.with_storage(storage);
        self
    }

    /// Runs the one-shot startup session check. Later calls are no-ops.
    pub fn initialize(&self) -> Hydration {
        self.auth_provider.initialize(&self.tokens, &self.auth_store)
    }

    /// The observable authentication state.
    #[must_use]
    pub const fn auth_store(&self) -> &AuthStore {
        &self.auth_store
    }

    /// The persisted tokens.
    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// The navigator redirects go through.
    #[must_use]
    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    /// Retrieves the current access token, if available.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.tokens.access_token()
    }

    /// Returns the base URL of the backend.
    ///
    /// # Example
    /// ```rust,ignore
    /// let store = FanStore::new("http://localhost:8080/api/");
    /// assert_eq!(store.base_url(), "http://localhost:8080/api".to_string());
    /// ```
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Returns the storefront base URL redirects are built on.
    #[must_use]
    pub const fn app_url(&self) -> &Url {
        &self.app_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `prefix` under the base URL followed by `segments`, each percent-encoded.
    pub(crate) fn endpoint_with(&self, prefix: &str, segments: &[&str]) -> String {
        let mut url = self.api_url.clone();

        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(prefix.split('/').filter(|segment| !segment.is_empty()))
                .extend(segments);
        }

        url.into()
    }
}

impl FanStore {
    /// Adds the stored access token to the request, if there is one.
    pub(crate) fn with_authorization_token(&self, request_builder: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.tokens.access_token() {
            request_builder.bearer_auth(token)
        } else {
            request_builder
        }
    }

    /// Creates a GET request builder, with query parameters when given.
    pub(crate) fn request_get(&self, endpoint: &str, params: Option<Vec<(&str, &str)>>) -> RequestBuilder {
        let mut request_builder = self
            .reqwest_client
            .get(endpoint)
            .header("Accept", "application/json");

        if let Some(params) = params {
            request_builder = request_builder.query(&params);
        }

        self.with_authorization_token(request_builder)
    }

    /// Creates a POST request builder without a body.
    pub(crate) fn request_post(&self, endpoint: &str) -> RequestBuilder {
        let request_builder = self.reqwest_client.post(endpoint);
        self.with_authorization_token(request_builder)
    }

    /// Creates a POST request builder with a JSON body.
    pub(crate) fn request_post_json<T: Serialize + ?Sized>(&self, endpoint: &str, params: &T) -> RequestBuilder {
        let request_builder = self.reqwest_client.post(endpoint).json(params);
        self.with_authorization_token(request_builder)
    }

    /// Creates a POST request builder with a multipart body.
    pub(crate) fn request_post_form(&self, endpoint: &str, form: Form) -> RequestBuilder {
        let request_builder = self.reqwest_client.post(endpoint).multipart(form);
        self.with_authorization_token(request_builder)
    }

    /// Creates a PUT request builder with a JSON body.
    pub(crate) fn request_put_json<T: Serialize + ?Sized>(&self, endpoint: &str, params: &T) -> RequestBuilder {
        let request_builder = self.reqwest_client.put(endpoint).json(params);
        self.with_authorization_token(request_builder)
    }

    /// Creates a PATCH request builder with a JSON body.
    pub(crate) fn request_patch_json<T: Serialize + ?Sized>(&self, endpoint: &str, params: &T) -> RequestBuilder {
        let request_builder = self.reqwest_client.patch(endpoint).json(params);
        self.with_authorization_token(request_builder)
    }

    /// Creates a DELETE request builder.
    pub(crate) fn request_delete(&self, endpoint: &str) -> RequestBuilder {
        let request_builder = self.reqwest_client.delete(endpoint);
        self.with_authorization_token(request_builder)
    }

    /// Sends `request` and applies the session rules to its response.
    ///
    /// - a non-empty `x-new-access-token` header replaces the stored access token;
    /// - a 401 ends the session (see [`FanStore::end_session`]) and yields
    ///   [`RequestError::Unauthorized`];
    /// - any other response is handed back untouched.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, RequestError> {
        let response = request.send().await?;

        if let Some(token) = response
            .headers()
            .get(NEW_ACCESS_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            match self.tokens.set_access_token(token) {
                Ok(()) => tracing::debug!(url = %response.url(), "access token rotated"),
                Err(error) => tracing::error!(%error, "could not store rotated access token"),
            }
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "backend rejected the session");
            self.end_session(Some(SESSION_EXPIRED_MESSAGE));
            return Err(RequestError::Unauthorized);
        }

        Ok(response)
    }

    /// Same as [`FanStore::send`], retrying up to `query_retries` times while
    /// the backend is unreachable. Only used for reads.
    pub(crate) async fn send_query(&self, request: RequestBuilder) -> Result<Response, RequestError> {
        let mut remaining = self.query_retries;
        let mut request = request;

        loop {
            let retry = if remaining > 0 { request.try_clone() } else { None };

            match (self.send(request).await, retry) {
                (Err(error), Some(next)) if error.is_network() => {
                    remaining -= 1;
                    tracing::warn!(%error, remaining, "query failed, retrying");
                    request = next;
                }
                (result, _) => return result,
            }
        }
    }

    /// Tears the local session down: clears stored tokens and the cached user,
    /// signs the auth store out, and when `message` is given sends the user to
    /// the login page unless they already are on an authentication page.
    pub fn end_session(&self, message: Option<&str>) {
        if let Err(error) = self.tokens.clear_all() {
            tracing::error!(%error, "could not clear stored session");
        }

        self.auth_store.clear_auth();

        let Some(message) = message else {
            return;
        };

        if self.navigator.is_on_auth_page() {
            tracing::debug!("already on an auth page, not redirecting");
            return;
        }

        let location = session::navigator::location_with_message(
            &self.app_url,
            session::navigator::LOGIN_PATH,
            message,
        );
        self.navigator.navigate(&location);
    }
}
