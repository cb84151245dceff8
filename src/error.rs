//! Various errors module.

use core::fmt;
use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

pub use crate::services::payment::PaymentError;
pub use crate::session::storage::StorageError;

/// Generic message shown when the backend cannot be reached at all.
pub const UNREACHABLE_MESSAGE: &str = "Cannot reach the server. Please check your connection and try again.";

/// Body returned by the backend alongside a non-success status.
///
/// Every field is optional: some endpoints answer with `{ "message": ... }`,
/// some with `{ "error": ... }`, validation failures add per-field `errors`.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorResponse {
    /// Human readable reason given by the backend.
    #[serde(default)]
    pub message: Option<String>,
    /// Alternative key some endpoints use instead of `message`.
    #[serde(default)]
    pub error: Option<String>,
    /// Validation failures keyed by field name.
    #[serde(default)]
    pub errors: HashMap<String, String>,
}

impl ErrorResponse {
    /// The best server-supplied message, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(ToString::to_string)
    }

    /// Field errors, flattened and sorted by field name.
    #[must_use]
    pub fn field_errors(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = self
            .errors
            .iter()
            .map(|(name, message)| FieldError {
                name: name.clone(),
                message: message.clone(),
            })
            .collect();

        errors.sort_by(|a, b| a.name.cmp(&b.name));
        errors
    }
}

/// A single rejected field from a validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the field.
    pub name: String,
    /// Why it was rejected.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Represents errors when interacting with the storefront API.
///
/// This enum provides a set of error types that may occur during
/// API requests, each indicating a specific issue encountered.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The backend answered [400 Bad Request]("https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/400")
    /// or [422 Unprocessable Content]("https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/422").
    ///
    /// Holds the server message and the rejected fields, when given.
    #[error("Bad Request: {message}")]
    BadRequest {
        /// Server-supplied reason.
        message: String,
        /// Per-field validation failures.
        fields: Vec<FieldError>,
    },
    /// The backend answered [401 Unauthorized]("https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/401").
    ///
    /// By the time this is returned the local session has already been torn down.
    #[error("Unauthorized: The session has expired or is invalid.")]
    Unauthorized,
    /// The backend answered [403 Forbidden]("https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/403").
    ///
    /// The authenticated user may not have permissions for this interaction.
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The backend answered [404 Not Found]("https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/404").
    #[error("Not Found: The requested resource could not be found.")]
    NotFound,
    /// Too many requests were sent to the API.
    #[error("Too Many Requests: The server is rate limiting requests. Please wait before retrying.")]
    TooManyRequests,
    /// Any other non-success status, with the server message when one was sent.
    #[error("API Error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-supplied reason.
        message: Option<String>,
    },
    /// The response could not be parsed into the expected data structure.
    #[error("Parse Error: Could not parse response into the expected data structure. - {0}")]
    ParseError(String),
    /// The backend could not be reached: connection refused, DNS failure or timeout.
    #[error("Unreachable: {0}")]
    Unreachable(String),
    /// The session could not be read from or written to storage.
    #[error("Storage Error: {0}")]
    Storage(#[from] StorageError),
    /// The caller supplied something that was rejected before any request was sent.
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    /// Unhandled error.
    ///
    /// Usually emitted when something unexpected happened, and isn't handled correctly by this crate.
    #[error("Unhandled Error: An unexpected error occurred.")]
    Unhandled,
}

impl From<reqwest::Error> for RequestError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if error.is_timeout() {
            Self::Unreachable("Request timed out".to_string())
        } else if error.is_connect() {
            Self::Unreachable("Failed to connect to server".to_string())
        } else if error.is_request() || error.is_body() {
            Self::Unreachable(error.to_string())
        } else {
            Self::Unhandled
        }
    }
}

impl RequestError {
    /// Builds the error matching a non-success status and its decoded body.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, body: &ErrorResponse) -> Self {
        match status {
            reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                Self::BadRequest {
                    message: body
                        .reason()
                        .unwrap_or_else(|| "The request was rejected.".to_string()),
                    fields: body.field_errors(),
                }
            }
            reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized,
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden(
                body.reason()
                    .unwrap_or_else(|| "You are not allowed to perform this action.".to_string()),
            ),
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            reqwest::StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests,
            _ => Self::Api {
                status: status.as_u16(),
                message: body.reason(),
            },
        }
    }

    /// Whether the backend could not be reached.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Whether the backend rejected the caller's credentials or permissions.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden(_))
    }

    /// The server-supplied message carried by this error, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::BadRequest { message, .. } | Self::Forbidden(message) => Some(message),
            Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text fit for display: the server message when there is one,
    /// a connectivity notice for network failures, `fallback` otherwise.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        if self.is_network() {
            return UNREACHABLE_MESSAGE.to_string();
        }

        self.server_message()
            .map_or_else(|| fallback.to_string(), ToString::to_string)
    }
}

/// The error services hand back to the UI layer.
///
/// `message` is ready to display; the underlying [`RequestError`] is kept as the source.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ServiceError {
    /// Text fit for display.
    pub message: String,
    /// What actually went wrong.
    #[source]
    pub source: RequestError,
}

impl ServiceError {
    /// Translates `source` into a displayable error, using `fallback` when the
    /// server gave no message of its own.
    #[must_use]
    pub fn new(source: RequestError, fallback: &str) -> Self {
        Self {
            message: source.user_message(fallback),
            source,
        }
    }

    /// Rejects caller input before any request is made.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        let message = message.into();

        Self {
            source: RequestError::InvalidInput(message.clone()),
            message,
        }
    }
}
