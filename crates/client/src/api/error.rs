//! Error types for the REST gateway.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the bazaar API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced a response (no connectivity, timeout, TLS).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-2xx status.
    ///
    /// `message` is the server's `error` field when present; it is shown to
    /// the user as-is.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided (or generic) message.
        message: String,
    },

    /// A 2xx body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A field held a value that could not be converted (e.g. a price that
    /// is not a decimal string).
    #[error("invalid {field} in response: {reason}")]
    InvalidData {
        /// Wire field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The request URL could not be built from the configured base.
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// Failure classes callers react to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request; show the message.
    Validation,
    /// Missing or expired token; the session must end.
    Unauthorized,
    /// Referenced entity does not exist.
    NotFound,
    /// No connectivity, timeout or overloaded server; retrying may help.
    Transient,
    /// Server-side failure.
    Server,
    /// Response could not be understood.
    Decode,
}

impl ApiError {
    /// Build the error for a non-2xx response from its status and raw body.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        Self::Status {
            status: status.as_u16(),
            message: error_message(status, body),
        }
    }

    /// Classify this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Transient,
            Self::Status { status, .. } => match *status {
                400 | 409 | 422 => ErrorKind::Validation,
                401 | 403 => ErrorKind::Unauthorized,
                404 => ErrorKind::NotFound,
                408 | 429 | 502 | 503 | 504 => ErrorKind::Transient,
                s if s >= 500 => ErrorKind::Server,
                _ => ErrorKind::Validation,
            },
            Self::Decode(_) | Self::InvalidData { .. } => ErrorKind::Decode,
            Self::Endpoint(_) => ErrorKind::Validation,
        }
    }

    /// Whether the session token was rejected.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body returned by the API: `{"error": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Extract the user-facing message from an error body.
///
/// A string `error` is used verbatim. Validation failures carry a list of
/// issues instead, which is rendered as compact JSON. Anything else falls
/// back to a generic status message.
fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = || format!("HTTP error! status: {}", status.as_u16());

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(serde_json::Value::String(message)),
        }) if !message.is_empty() => message,
        Ok(ErrorBody {
            error: Some(value),
        }) if !value.is_null() && !matches!(value, serde_json::Value::String(_)) => {
            value.to_string()
        }
        _ => fallback(),
    }
}
