//! Persisted session credentials.
//!
//! The bearer token and the user id always travel together, so a session
//! can never be half-persisted.

use secrecy::{ExposeSecret, SecretString};

use super::id::CustomerId;

/// Bearer token plus the id of the customer it was issued for.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Credentials {
    token: SecretString,
    user_id: CustomerId,
}

impl Credentials {
    /// Pair a freshly issued token with its user id.
    #[must_use]
    pub const fn new(token: SecretString, user_id: CustomerId) -> Self {
        Self { token, user_id }
    }

    /// The opaque bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// The customer this token belongs to.
    #[must_use]
    pub const fn user_id(&self) -> CustomerId {
        self.user_id
    }

    /// `Authorization` header value for this token.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        bearer_header(&self.token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Format an `Authorization: Bearer` header value.
#[must_use]
pub fn bearer_header(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::new(SecretString::from("eyJhbGciOi.secret"), CustomerId::new(4));
        let debug_output = format!("{creds:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains('4'));
        assert!(!debug_output.contains("eyJhbGciOi.secret"));
    }

    #[test]
    fn test_bearer_header() {
        let creds = Credentials::new(SecretString::from("abc"), CustomerId::new(1));
        assert_eq!(creds.bearer_header(), "Bearer abc");
        assert_eq!(creds.user_id(), CustomerId::new(1));
    }
}
