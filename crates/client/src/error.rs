//! Unified error handling with Sentry integration.
//!
//! Provides the `AppError` type returned by every `Bazaar` operation, its
//! user-facing messages in both app languages, and the Sentry scope helpers
//! used on session transitions.

use bazaar_core::Language;
use thiserror::Error;

use crate::api::{ApiError, ErrorKind};
use crate::config::ConfigError;
use crate::store::persist::PersistError;

/// Application-level error type for the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Loading or saving local state failed.
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Referenced local entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Failure class, for errors that fit the API taxonomy.
    ///
    /// Local persistence and configuration failures have no class.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api(err) => Some(err.kind()),
            Self::Validation(_) | Self::EmptyCart => Some(ErrorKind::Validation),
            Self::NotFound(_) => Some(ErrorKind::NotFound),
            Self::Persist(_) | Self::Config(_) => None,
        }
    }

    /// Whether the server rejected the session token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == Some(ErrorKind::Unauthorized)
    }

    /// Message to show the user.
    ///
    /// Server-provided messages are passed through as-is (the API already
    /// answers in Arabic). Everything else gets a fixed localized text.
    #[must_use]
    pub fn user_message(&self, language: Language) -> String {
        let (ar, en) = match self {
            Self::Api(ApiError::Status { message, .. }) | Self::Validation(message) => {
                return message.clone();
            }
            Self::Api(err) if err.kind() == ErrorKind::Transient => (
                "تعذر الاتصال بالخادم، حاول مرة أخرى",
                "Could not reach the server, please try again",
            ),
            Self::Api(_) => ("حدث خطأ غير متوقع", "Something went wrong"),
            Self::EmptyCart => ("السلة فارغة", "Your cart is empty"),
            Self::NotFound(_) => ("العنصر غير موجود", "Item not found"),
            Self::Persist(_) | Self::Config(_) => (
                "تعذر حفظ البيانات على الجهاز",
                "Could not access data on this device",
            ),
        };
        match language {
            Language::Ar => ar.to_string(),
            Language::En => en.to_string(),
        }
    }

    /// Capture unexpected failures to Sentry and log them.
    ///
    /// Validation, auth and not-found errors are expected outcomes and only
    /// logged at debug.
    pub fn report(&self) {
        match self.kind() {
            Some(ErrorKind::Validation | ErrorKind::Unauthorized | ErrorKind::NotFound) => {
                tracing::debug!(error = %self, "Operation rejected");
            }
            _ => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Operation failed"
                );
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "p-12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_passes_through() {
        let err = AppError::from(ApiError::Status {
            status: 400,
            message: "البريد الإلكتروني مستخدم بالفعل".to_string(),
        });
        assert_eq!(err.user_message(Language::En), "البريد الإلكتروني مستخدم بالفعل");
        assert_eq!(err.to_string(), "البريد الإلكتروني مستخدم بالفعل");
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_local_errors_are_localized() {
        assert_eq!(AppError::EmptyCart.user_message(Language::Ar), "السلة فارغة");
        assert_eq!(
            AppError::EmptyCart.user_message(Language::En),
            "Your cart is empty"
        );
        assert_eq!(
            AppError::NotFound("address local-1".to_string()).to_string(),
            "Not found: address local-1"
        );
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = AppError::from(ApiError::Status {
            status: 401,
            message: "غير مصرح".to_string(),
        });
        assert!(err.is_unauthorized());
        assert!(!AppError::EmptyCart.is_unauthorized());
    }
}
