//! Authentication error types.

use onlineshop_core::ErrorEnvelope;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Message shown when a login fails without a usable backend message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// Errors that can occur during login.
///
/// Hydration, refresh, and logout never fail: they resolve to a session
/// state and log what went wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials rejected, backend unreachable, or the user record could
    /// not be fetched with the new token.
    #[error("{message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<ApiError>,
    },

    /// The new credentials could not be persisted.
    #[error("failed to persist credentials: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Wrap a failed login or user fetch, preferring the backend's message.
    #[must_use]
    pub fn from_login_failure(source: ApiError) -> Self {
        let message = source
            .backend_message()
            .map_or_else(|| LOGIN_FAILED_MESSAGE.to_string(), ToString::to_string);
        Self::Authentication {
            message,
            source: Some(source),
        }
    }

    /// The uniform envelope for this failure.
    ///
    /// The inline message is always the login message; status and code come
    /// from the underlying request when there was one.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Authentication { message, source } => {
                let underlying = source.as_ref().map(ApiError::envelope);
                ErrorEnvelope::new(
                    underlying.as_ref().and_then(|e| e.status),
                    message.clone(),
                    underlying.and_then(|e| e.error_code),
                )
            }
            Self::Storage(_) => ErrorEnvelope::new(None, LOGIN_FAILED_MESSAGE, None),
        }
    }
}
