//! Unified error handling with Sentry integration.
//!
//! Every failure a consumer can see converts to an [`ErrorEnvelope`], the
//! single shape the failure view renders. [`ClientError`] is the umbrella
//! type returned by the CLI; [`ApiError::envelope`] holds the normalization
//! rules for request failures.

use onlineshop_core::envelope::{
    CONNECT_MESSAGE, GENERIC_MESSAGE, MALFORMED_MESSAGE, TIMEOUT_MESSAGE, status_message,
};
use onlineshop_core::ErrorEnvelope;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::AuthError;
use crate::storage::StorageError;

const INVALID_REQUEST_MESSAGE: &str = "The request could not be built. Check the configured server URL.";

/// Longest plain-text error body shown to the user verbatim.
const MAX_PLAIN_MESSAGE_LEN: usize = 200;

/// Application-level error type for the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Credential storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// No user is logged in.
    #[error("Not logged in")]
    Unauthenticated,

    /// The logged-in user lacks the required role.
    #[error("Access denied")]
    Forbidden,
}

impl ClientError {
    /// The uniform envelope for this failure.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Api(e) => e.envelope(),
            Self::Auth(e) => e.envelope(),
            Self::Config(e) => ErrorEnvelope::new(None, e.to_string(), None),
            Self::Storage(e) => ErrorEnvelope::new(None, e.to_string(), None),
            Self::Unauthenticated => ErrorEnvelope::new(
                Some(401),
                status_message(401),
                Some("Unauthorized".to_string()),
            ),
            Self::Forbidden => ErrorEnvelope::forbidden(),
        }
    }

    /// Capture unexpected failures to Sentry and log them.
    ///
    /// Expected outcomes (4xx, rejected logins, guard denials) are not captured.
    pub fn report(&self) {
        let unexpected = match self {
            Self::Api(e) => e.status().is_none_or(|status| status >= 500),
            Self::Config(_) | Self::Storage(_) => true,
            Self::Auth(AuthError::Storage(_)) => true,
            Self::Auth(_) | Self::Unauthenticated | Self::Forbidden => false,
        };

        if unexpected {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
    }
}

impl ApiError {
    /// Normalize this failure into the uniform envelope.
    ///
    /// - A backend error body supplies status, message, and code.
    /// - A non-JSON error body keeps the HTTP status; short plain text is
    ///   used as the message, anything else gets a message naming the status.
    /// - Transport and decode failures get a message specific to the failure.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Status {
                status,
                detail: Some(body),
                ..
            } => ErrorEnvelope::from_body(*status, body),
            Self::Status {
                status,
                detail: None,
                raw,
            } => {
                let message =
                    plain_text_message(raw).map_or_else(|| status_message(*status), ToString::to_string);
                ErrorEnvelope::new(Some(*status), message, None)
            }
            Self::Http(e) => {
                let message = if e.is_timeout() {
                    TIMEOUT_MESSAGE
                } else if e.is_connect() {
                    CONNECT_MESSAGE
                } else if e.is_decode() || e.is_body() {
                    MALFORMED_MESSAGE
                } else if e.is_builder() {
                    INVALID_REQUEST_MESSAGE
                } else {
                    GENERIC_MESSAGE
                };
                ErrorEnvelope::new(self.status(), message, None)
            }
            Self::Json(_) => ErrorEnvelope::new(None, MALFORMED_MESSAGE, None),
        }
    }
}

/// The body text, if it reads as a short human message rather than markup
/// or a serialized document.
fn plain_text_message(raw: &str) -> Option<&str> {
    let text = raw.trim();
    if text.is_empty() || text.chars().count() > MAX_PLAIN_MESSAGE_LEN {
        return None;
    }
    if text.starts_with(['<', '{', '[']) {
        return None;
    }
    Some(text)
}

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
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
/// add_breadcrumb("orders", "Placed order", Some(&[("product_id", "3")]));
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
