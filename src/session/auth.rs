//! Sign-in, registration, sign-out and token refresh against the backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::storage::StorageError;
use super::user::User;
use crate::error::RequestError;
use crate::resource::read_data;
use crate::FanStore;

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Tokens and user returned by a successful sign-in.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    #[serde(alias = "token")]
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// The signed-in account.
    pub user: User,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"***REDACTED***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***REDACTED***"))
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// New account details for [`FanStore::register`].
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Contact phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Default shipping address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Represents errors that can occur while signing in.
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// Identity and/or password cannot be empty.
    ///
    /// - `identity`: is blank and shouldn't be.
    /// - `password`: is blank and shouldn't be.
    #[error("Authentication failed: Empty Credential Field. Given identity and/or password is empty.")]
    EmptyField {
        /// Is identity blank.
        identity: bool,
        /// Is password blank.
        password: bool,
    },
    /// The backend refused the credentials.
    #[error("Authentication failed: {0}")]
    InvalidCredentials(String),
    /// The credentials are right but the account may not sign in (locked, unverified).
    #[error("Authentication refused: {0}")]
    Forbidden(String),
    /// The backend could not be reached.
    #[error("Authentication failed. Couldn't reach the storefront API: {0}")]
    Unreachable(String),
    /// The session could not be persisted.
    #[error("Authentication succeeded but the session could not be stored: {0}")]
    Storage(#[from] StorageError),
    /// When something unexpected was returned by the backend.
    #[error("Authentication failed due to an unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<RequestError> for AuthenticationError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::BadRequest { message, .. } => Self::InvalidCredentials(message),
            RequestError::Unauthorized => {
                Self::InvalidCredentials("Incorrect email/username or password.".to_string())
            }
            RequestError::Forbidden(message) => Self::Forbidden(message),
            RequestError::Unreachable(reason) => Self::Unreachable(reason),
            RequestError::Storage(error) => Self::Storage(error),
            other => Self::UnexpectedResponse(other.to_string()),
        }
    }
}

impl FanStore {
    /// Sign in with an email or username and a password.
    ///
    /// On success the tokens and the user are stored and the auth store is
    /// marked as authenticated.
    ///
    /// # Example
    /// ```rust,ignore
    /// let session = store.login("khach@example.com", "YOUR_PASSWORD").await?;
    ///
    /// println!("Signed in as {}", session.user.username);
    /// ```
    pub async fn login(&self, identity: &str, password: &str) -> Result<LoginResponse, AuthenticationError> {
        let identity = identity.trim();

        if identity.is_empty() || password.is_empty() {
            return Err(AuthenticationError::EmptyField {
                identity: identity.is_empty(),
                password: password.is_empty(),
            });
        }

        let credentials = if identity.contains('@') {
            Credentials {
                email: Some(identity),
                username: None,
                password,
            }
        } else {
            Credentials {
                email: None,
                username: Some(identity),
                password,
            }
        };

        let request = self.request_post_json(&self.endpoint("auth/login"), &credentials);
        let response = self.send(request).await?;
        let session: LoginResponse = read_data(response).await?;

        self.start_session(&session)?;
        tracing::info!(user_id = %session.user.id, role = %session.user.role, "signed in");

        Ok(session)
    }

    /// Create a customer account. Does not sign in.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<User, RequestError> {
        if payload.username.trim().is_empty() || payload.email.trim().is_empty() || payload.password.is_empty() {
            return Err(RequestError::InvalidInput(
                "Username, email and password are required".to_string(),
            ));
        }

        let request = self.request_post_json(&self.endpoint("auth/register"), payload);
        let response = self.send(request).await?;

        read_data(response).await
    }

    /// Sign out.
    ///
    /// The backend is told about it on a best-effort basis; the local session
    /// is torn down whatever it answers.
    pub async fn logout(&self) {
        if self.tokens.access_token().is_some() {
            let refresh_token = self.tokens.refresh_token().unwrap_or_default();
            let request = self.request_post_json(
                &self.endpoint("auth/logout"),
                &RefreshRequest {
                    refresh_token: &refresh_token,
                },
            );

            match self.send(request).await {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!(status = %response.status(), "backend logout refused");
                }
                Err(error) => tracing::debug!(%error, "backend logout failed"),
                Ok(_) => {}
            }
        }

        self.end_session(None);
        tracing::info!("signed out");
    }

    /// Fetch the signed-in user and refresh the cached copy.
    pub async fn current_user(&self) -> Result<User, RequestError> {
        let request = self.request_get(&self.endpoint("auth/me"), None);
        let response = self.send_query(request).await?;
        let user: User = read_data(response).await?;

        self.tokens.set_cached_user(&user)?;
        self.auth_store.set_user(Some(user.clone()));

        Ok(user)
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh_session(&self) -> Result<String, RequestError> {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            return Err(RequestError::InvalidInput("No refresh token is stored".to_string()));
        };

        let request = self.request_post_json(
            &self.endpoint("auth/refresh"),
            &RefreshRequest {
                refresh_token: &refresh_token,
            },
        );
        let response = self.send(request).await?;
        let refreshed: RefreshResponse = read_data(response).await?;

        self.tokens.set_access_token(&refreshed.access_token)?;
        if let Some(refresh_token) = refreshed.refresh_token.as_deref() {
            self.tokens.set_refresh_token(refresh_token)?;
        }
        tracing::debug!("session refreshed");

        Ok(refreshed.access_token)
    }

    fn start_session(&self, session: &LoginResponse) -> Result<(), StorageError> {
        self.tokens.set_access_token(&session.access_token)?;

        match session.refresh_token.as_deref() {
            Some(refresh_token) => self.tokens.set_refresh_token(refresh_token)?,
            None => self.tokens.clear_refresh_token()?,
        }

        self.tokens.set_cached_user(&session.user)?;
        self.auth_store.set_user(Some(session.user.clone()));

        Ok(())
    }
}
