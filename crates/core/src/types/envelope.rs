//! Error body and the uniform error envelope.
//!
//! Every failed request, whatever its cause, is shown to the user through an
//! [`ErrorEnvelope`]. The backend's own error body ([`ErrorBody`]) is the
//! richest source; transport failures fall back to the generic messages below.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message shown when nothing more specific is known.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";
/// Message for a request that did not complete in time.
pub const TIMEOUT_MESSAGE: &str = "The server took too long to respond. Please try again.";
/// Message for a backend that could not be reached at all.
pub const CONNECT_MESSAGE: &str = "Could not reach the server. Check your connection and try again.";
/// Message for a response whose body could not be understood.
pub const MALFORMED_MESSAGE: &str = "The server sent a response that could not be read.";
/// Message for the access guard's forbidden outcome.
pub const ACCESS_DENIED_MESSAGE: &str =
    "Access Denied. You do not have sufficient privileges to access this resource.";

/// Error body produced by the backend's exception handlers.
///
/// All fields are optional: different handlers fill different subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status: Option<u16>,
    /// HTTP reason phrase, e.g. `Not Found`.
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub path: Option<String>,
    /// As sent: an ISO string, or the JSON text of a date array.
    pub timestamp: Option<String>,
}

impl ErrorBody {
    /// Parse a response body, returning `None` for anything that is not a
    /// JSON object carrying at least one recognised field.
    ///
    /// Fields are read one by one, so a field of an unexpected type is
    /// dropped without losing the rest of the body.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        let object = value.as_object()?;

        let text = |key: &str| object.get(key).and_then(Value::as_str).map(ToOwned::to_owned);
        let body = Self {
            status: object.get("status").and_then(status_field),
            error: text("error"),
            error_code: text("errorCode"),
            message: text("message"),
            path: text("path"),
            timestamp: object.get("timestamp").and_then(|t| match t {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
        };

        if body == Self::default() { None } else { Some(body) }
    }

    /// The backend's message, if it sent a non-blank one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// HTTP status as a number or a numeric string.
fn status_field(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The normalized `{status, message, errorCode}` shape of a failure.
///
/// Deserializing goes through the same blank-message check as
/// [`ErrorEnvelope::new`]: a blank message is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawEnvelope")]
pub struct ErrorEnvelope {
    pub status: Option<u16>,
    message: String,
    pub error_code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    #[serde(default)]
    status: Option<u16>,
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

/// Error returned when a serialized envelope carries a blank message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error envelope message must not be blank")]
pub struct BlankMessageError;

impl TryFrom<RawEnvelope> for ErrorEnvelope {
    type Error = BlankMessageError;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        if raw.message.trim().is_empty() {
            return Err(BlankMessageError);
        }
        Ok(Self {
            status: raw.status,
            message: raw.message,
            error_code: raw.error_code,
        })
    }
}

impl ErrorEnvelope {
    /// Build an envelope. A blank message is replaced with [`GENERIC_MESSAGE`].
    #[must_use]
    pub fn new(status: Option<u16>, message: impl Into<String>, error_code: Option<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_MESSAGE.to_owned()
        } else {
            message
        };
        Self {
            status,
            message,
            error_code,
        }
    }

    /// Envelope for a non-2xx response that carried a backend error body.
    ///
    /// The body's own status wins over the transport status; `errorCode`
    /// falls back to the reason phrase.
    #[must_use]
    pub fn from_body(http_status: u16, body: &ErrorBody) -> Self {
        let status = body.status.unwrap_or(http_status);
        let message = body
            .message()
            .map_or_else(|| status_message(status), ToOwned::to_owned);
        let error_code = body
            .error_code
            .clone()
            .or_else(|| body.error.clone())
            .filter(|c| !c.trim().is_empty());
        Self::new(Some(status), message, error_code)
    }

    /// The guard's 403 envelope.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(Some(403), ACCESS_DENIED_MESSAGE, Some("Forbidden".to_owned()))
    }

    /// Human-readable message. Never empty.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Generic message naming an HTTP status.
#[must_use]
pub fn status_message(status: u16) -> String {
    match status {
        401 => "You need to log in to continue.".to_owned(),
        403 => ACCESS_DENIED_MESSAGE.to_owned(),
        404 => "The requested resource was not found.".to_owned(),
        500..=599 => format!("The server failed to handle the request (HTTP {status})."),
        _ => format!("Request failed with HTTP status {status}."),
    }
}
