//! Shop context shared by every consumer.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::session::SessionStore;
use crate::storage::{CredentialStore, FileCredentialStore};

/// The API client and session store for one process.
///
/// This struct is cheaply cloneable via `Arc` and is constructed once at
/// startup, then passed to whatever needs the session or the backend.
#[derive(Clone)]
pub struct ShopContext {
    inner: Arc<ShopContextInner>,
}

struct ShopContextInner {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionStore,
}

impl ShopContext {
    /// Create a context persisting credentials to the configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let store = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        Self::with_store(config, store)
    }

    /// Create a context with a caller-supplied credential store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_store(
        config: StorefrontConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config, credentials)?;
        let session = SessionStore::new(api.clone(), config.stale_credentials);

        Ok(Self {
            inner: Arc::new(ShopContextInner {
                config,
                api,
                session,
            }),
        })
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }
}

impl std::fmt::Debug for ShopContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopContext")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_shares_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            StorefrontConfig::for_base_url("http://127.0.0.1:1", dir.path().join("credentials.json"));
        let context = ShopContext::new(config).unwrap();
        let clone = context.clone();

        context.session().hydrate().await;
        assert!(!clone.session().snapshot().loading);
        assert_eq!(clone.api().base_url(), "http://127.0.0.1:1");
    }
}
