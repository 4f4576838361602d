//! HTTP client adapter for the shop backend.
//!
//! [`ApiClient`] is the single egress point: every request is built against a
//! configured base URL, and requests built through [`ApiClient::request`] (or
//! the verb shortcuts) carry `Authorization: Bearer <token>` whenever
//! credentials are persisted.
//!
//! The verb methods return the underlying [`reqwest::RequestBuilder`], so the
//! caller keeps control of headers, body, and response handling. The `send_*`
//! helpers cover the common cases and map non-2xx responses to
//! [`ApiError::Status`].
//!
//! # Example
//!
//! ```rust,ignore
//! use onlineshop_storefront::api::ApiClient;
//!
//! let api = ApiClient::new(&config, credentials)?;
//! let products: Vec<Product> = api.send_json(api.get("/products")).await?;
//! let receipt = api.send_bytes(api.get("/orders/3/receipt")).await?;
//! ```

mod auth;
mod customers;
mod orders;
mod products;

pub use auth::RegisterRequest;
pub use customers::{AddAdminRequest, UpdateCustomerRequest};
pub use orders::CreateOrderRequest;
pub use products::ProductRequest;

use std::sync::Arc;

use onlineshop_core::ErrorBody;
use onlineshop_core::credential::bearer_header;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, multipart};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::StorefrontConfig;
use crate::storage::CredentialStore;

const USER_AGENT: &str = concat!("onlineshop/", env!("CARGO_PKG_VERSION"));

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failed: connect, timeout, TLS, or request construction.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("request failed with status {status}")]
    Status {
        status: u16,
        /// Parsed backend error body, when the response carried one.
        detail: Option<ErrorBody>,
        /// Raw response body text.
        raw: String,
    },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the failure, if the backend or transport reported one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Json(_) => None,
        }
    }

    /// Whether the backend rejected the bearer token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Backend message from the error body, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.message(),
            _ => None,
        }
    }
}

/// Binary response body, e.g. a product image or a PDF receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// File attached to a multipart product or profile update.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Guess the content type from the file extension.
    #[must_use]
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = std::path::Path::new(&file_name)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let content_type = match extension.as_deref() {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
        .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

/// Client for the shop backend.
///
/// Cheap to clone; all clones share one connection pool and credential store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    auth_base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("auth_base_url", &self.inner.auth_base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration and a credential store to read
    /// bearer tokens from.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: &StorefrontConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.api_base_url.trim_end_matches('/').to_string(),
                auth_base_url: config.auth_base_url.trim_end_matches('/').to_string(),
                credentials,
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The credential store bearer tokens are read from.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.inner.base_url, path)
    }

    /// Absolute URL for an auth path.
    #[must_use]
    pub fn auth_url(&self, path: &str) -> String {
        join_url(&self.inner.auth_base_url, path)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request Builders
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a request against the API base URL, attaching the persisted
    /// bearer token if there is one.
    ///
    /// A storage read failure is logged and the request goes out without
    /// credentials.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.inner.client.request(method, self.url(path));
        match self.inner.credentials.load() {
            Ok(Some(credentials)) => builder.header(AUTHORIZATION, credentials.bearer_header()),
            Ok(None) => builder,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read credentials, sending request unauthenticated");
                builder
            }
        }
    }

    /// Build a request with an explicit bearer token instead of the persisted one.
    #[must_use]
    pub fn request_with_token(
        &self,
        method: Method,
        path: &str,
        token: &SecretString,
    ) -> RequestBuilder {
        self.inner
            .client
            .request(method, self.url(path))
            .header(AUTHORIZATION, bearer_header(token))
    }

    /// Build an unauthenticated request against the auth base URL.
    #[must_use]
    pub fn auth_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner.client.request(method, self.auth_url(path))
    }

    /// `GET` with bearer injection.
    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    /// `POST` with bearer injection.
    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    /// `PUT` with bearer injection.
    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    /// `DELETE` with bearer injection.
    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Response Handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request and decode a JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for non-2xx responses, `ApiError::Json` if
    /// the body does not decode as `T`, and `ApiError::Http` on transport failure.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = check_status(request.send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request and return the response body as text.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::send_json`], minus decoding.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = check_status(request.send().await?).await?;
        Ok(response.text().await?)
    }

    /// Send a request and return the raw body with its content type.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::send_text`].
    pub async fn send_bytes(&self, request: RequestBuilder) -> Result<Binary, ApiError> {
        let response = check_status(request.send().await?).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(Binary {
            bytes,
            content_type,
        })
    }
}

/// Join a path onto a base URL with exactly one `/` between them.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Turn a non-2xx response into `ApiError::Status`.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let detail = ErrorBody::parse(&raw);
    tracing::debug!(status = status.as_u16(), body = %raw, "Backend returned error status");

    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
        raw,
    })
}

/// Multipart form with a JSON part named `field` and an optional `file` part.
fn json_multipart<T: Serialize>(
    field: &'static str,
    body: &T,
    file: Option<ImageUpload>,
) -> Result<multipart::Form, ApiError> {
    let json = serde_json::to_string(body)?;
    let mut form = multipart::Form::new().part(
        field,
        multipart::Part::text(json).mime_str("application/json")?,
    );
    if let Some(file) = file {
        form = form.part(
            "file",
            multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?,
        );
    }
    Ok(form)
}
