//! Authentication endpoints.
//!
//! Both go to the auth base URL and never carry a bearer token.

use onlineshop_core::{Credentials, CustomerId, deserialize_lenient_id};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    #[serde(deserialize_with = "deserialize_lenient_id")]
    user_id: CustomerId,
}

#[derive(Deserialize)]
pub(super) struct RegisterResponse {
    pub(super) message: String,
}

/// Self-service account registration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub phone: String,
    pub password: SecretString,
    pub address: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("address", &self.address)
            .finish()
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    phone: &'a str,
    password: &'a str,
    address: &'a str,
}

impl ApiClient {
    /// Exchange a username and password for a bearer token.
    ///
    /// Nothing is persisted here; the session store decides when to save.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` when the backend rejects the credentials.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Credentials, ApiError> {
        let request = self
            .auth_request(Method::POST, "/auth/login")
            .json(&LoginRequest {
                username,
                password: password.expose_secret(),
            });
        let response: LoginResponse = self.send_json(request).await?;

        tracing::debug!(user_id = %response.user_id, "Login accepted");
        Ok(Credentials::new(
            SecretString::from(response.token),
            response.user_id,
        ))
    }

    /// Register a new customer account. Returns the backend's message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ApiError> {
        let body = RegisterBody {
            username: &request.username,
            phone: &request.phone,
            password: request.password.expose_secret(),
            address: &request.address,
        };
        let response: RegisterResponse = self
            .send_json(self.auth_request(Method::POST, "/auth/register").json(&body))
            .await?;
        Ok(response.message)
    }
}
