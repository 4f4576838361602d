//! Process-wide authentication state.
//!
//! [`SessionStore`] owns the answer to "who is logged in". It is created once
//! per process, hydrated from persisted credentials at startup, and mutated
//! only by [`SessionStore::login`], [`SessionStore::logout`], and
//! [`SessionStore::refresh`].
//!
//! Every mutation publishes a fresh [`SessionSnapshot`] on a watch channel.
//! Consumers hold a receiver from [`SessionStore::subscribe`] and re-evaluate
//! whenever it changes; nothing reads the state through shared mutable access.
//!
//! # Flow
//!
//! 1. `hydrate()` runs once: persisted credentials are checked against
//!    `GET /customers/{userId}`; `loading` drops to `false` either way
//! 2. `login()` exchanges a password for a token, fetches the user with it,
//!    and only then persists the credentials
//! 3. `refresh()` re-fetches the user after a profile change
//! 4. `logout()` forgets everything locally

mod error;

pub use error::{AuthError, LOGIN_FAILED_MESSAGE};

use std::sync::Arc;

use onlineshop_core::{Credentials, Customer, Role};
use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tracing::instrument;

use crate::api::ApiClient;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::storage::CredentialStore;

/// What hydration does with persisted credentials the backend rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleCredentialPolicy {
    /// Keep them; the next start retries with the same token.
    #[default]
    Keep,
    /// Clear them when the user fetch answers 401. Transport failures never clear.
    ClearOnUnauthorized,
}

/// Immutable view of the session at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// The hydrated user, or `None` when nobody is logged in.
    pub user: Option<Customer>,
    /// True only while the startup hydration pass is running.
    pub loading: bool,
}

impl SessionSnapshot {
    /// State before hydration.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    /// Settled state with the given user.
    #[must_use]
    pub const fn settled(user: Option<Customer>) -> Self {
        Self {
            user,
            loading: false,
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Role of the logged-in user.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// Shared session state.
///
/// Cheap to clone; clones observe and mutate the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    api: ApiClient,
    credentials: Arc<dyn CredentialStore>,
    policy: StaleCredentialPolicy,
    state: watch::Sender<SessionSnapshot>,
    /// Serializes operations. Guards whether hydration has already happened.
    ops: Mutex<Progress>,
}

#[derive(Default)]
struct Progress {
    hydrated: bool,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("policy", &self.inner.policy)
            .field("snapshot", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a session store that reads and writes credentials through the
    /// same store the API client injects bearer tokens from.
    #[must_use]
    pub fn new(api: ApiClient, policy: StaleCredentialPolicy) -> Self {
        let credentials = Arc::clone(api.credentials());
        Self {
            inner: Arc::new(SessionStoreInner {
                api,
                credentials,
                policy,
                state: watch::Sender::new(SessionSnapshot::initial()),
                ops: Mutex::new(Progress::default()),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<Customer> {
        self.inner.state.borrow().user.clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Wait until hydration has finished and return the settled snapshot.
    pub async fn wait_until_hydrated(&self) -> SessionSnapshot {
        let mut receiver = self.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        match receiver.wait_for(|snapshot| !snapshot.loading).await {
            Ok(snapshot) => (*snapshot).clone(),
            Err(_) => self.snapshot(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Establish the session from persisted credentials.
    ///
    /// Runs once per store; later calls return the current snapshot without
    /// touching the network. Never fails: a rejected or unreachable session
    /// downgrades to "logged out".
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> SessionSnapshot {
        let mut progress = self.inner.ops.lock().await;
        if progress.hydrated {
            return self.snapshot();
        }

        let user = match self.inner.credentials.load() {
            Ok(Some(credentials)) => self.fetch_user_for_hydration(&credentials).await,
            Ok(None) => {
                tracing::debug!("No persisted credentials");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted credentials");
                None
            }
        };

        if let Some(user) = &user {
            set_sentry_user(&user.id, Some(&user.username));
        }
        progress.hydrated = true;
        self.inner.state.send_replace(SessionSnapshot::settled(user));
        self.snapshot()
    }

    async fn fetch_user_for_hydration(&self, credentials: &Credentials) -> Option<Customer> {
        match self
            .inner
            .api
            .get_customer_with_token(credentials.user_id(), credentials.token())
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "Session restored");
                Some(user)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %credentials.user_id(),
                    error = %e,
                    "Session hydration failed, continuing logged out"
                );
                if self.inner.policy == StaleCredentialPolicy::ClearOnUnauthorized
                    && e.is_unauthorized()
                {
                    match self.inner.credentials.clear() {
                        Ok(()) => tracing::info!("Cleared rejected credentials"),
                        Err(e) => tracing::warn!(error = %e, "Failed to clear rejected credentials"),
                    }
                }
                None
            }
        }
    }

    /// Log in with a username and password.
    ///
    /// Credentials are persisted only once the user record has been fetched
    /// with the new token, so a failed login leaves storage and the current
    /// user exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Authentication` if the backend rejects the login,
    /// cannot be reached, or the user fetch fails, and `AuthError::Storage`
    /// if the credentials cannot be saved.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Customer, AuthError> {
        let mut progress = self.inner.ops.lock().await;

        let credentials = self
            .inner
            .api
            .login(username, password)
            .await
            .map_err(AuthError::from_login_failure)?;
        let user = self
            .inner
            .api
            .get_customer_with_token(credentials.user_id(), credentials.token())
            .await
            .map_err(AuthError::from_login_failure)?;

        self.inner.credentials.save(&credentials)?;

        progress.hydrated = true;
        self.inner
            .state
            .send_replace(SessionSnapshot::settled(Some(user.clone())));

        set_sentry_user(&user.id, Some(&user.username));
        add_breadcrumb("auth", "Logged in", Some(&[("role", user.role.as_str())]));
        tracing::info!(user_id = %user.id, username = %user.username, "Logged in");

        Ok(user)
    }

    /// Forget the session locally. Never fails.
    ///
    /// The backend has no token revocation, so nothing is sent over the network.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let mut progress = self.inner.ops.lock().await;

        if let Err(e) = self.inner.credentials.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted credentials");
        }

        progress.hydrated = true;
        self.inner.state.send_replace(SessionSnapshot::settled(None));

        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
        tracing::info!("Logged out");
    }

    /// Re-fetch the user record, e.g. after a profile edit.
    ///
    /// A failure is logged and leaves the current user untouched. Without
    /// persisted credentials this does nothing.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> SessionSnapshot {
        let _progress = self.inner.ops.lock().await;

        let credentials = match self.inner.credentials.load() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return self.snapshot(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted credentials");
                return self.snapshot();
            }
        };

        match self
            .inner
            .api
            .get_customer_with_token(credentials.user_id(), credentials.token())
            .await
        {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "Refreshed user");
                self.inner.state.send_modify(|snapshot| snapshot.user = Some(user));
            }
            Err(e) => {
                tracing::warn!(error = %e, "User refresh failed, keeping current user");
            }
        }

        self.snapshot()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use onlineshop_core::CustomerId;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryCredentialStore;

    fn store_with(credentials: MemoryCredentialStore) -> SessionStore {
        // Nothing in these tests reaches the network.
        let config = StorefrontConfig::for_base_url("http://127.0.0.1:1", "/dev/null");
        let api = ApiClient::new(&config, Arc::new(credentials)).unwrap();
        SessionStore::new(api, StaleCredentialPolicy::Keep)
    }

    #[test]
    fn test_initial_snapshot_is_loading() {
        let session = store_with(MemoryCredentialStore::new());
        let snapshot = session.snapshot();
        assert!(snapshot.loading);
        assert!(snapshot.user.is_none());
        assert_eq!(snapshot, SessionSnapshot::default());
    }

    #[tokio::test]
    async fn test_hydrate_without_credentials() {
        let session = store_with(MemoryCredentialStore::new());
        let mut receiver = session.subscribe();

        let snapshot = session.hydrate().await;
        assert!(!snapshot.loading);
        assert!(!snapshot.is_authenticated());

        assert!(receiver.has_changed().unwrap());
        assert!(!receiver.borrow_and_update().loading);
    }

    #[tokio::test]
    async fn test_wait_until_hydrated() {
        let session = store_with(MemoryCredentialStore::new());
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_until_hydrated().await })
        };

        session.hydrate().await;
        let snapshot = waiter.await.unwrap();
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_logout_clears_credentials() {
        let session = store_with(MemoryCredentialStore::with_credentials(Credentials::new(
            SecretString::from("tok"),
            CustomerId::new(5),
        )));

        session.logout().await;

        assert!(session.inner.credentials.load().unwrap().is_none());
        let snapshot = session.snapshot();
        assert!(!snapshot.loading);
        assert!(snapshot.user.is_none());

        // A later hydrate is a no-op.
        assert_eq!(session.hydrate().await, snapshot);
    }

    #[tokio::test]
    async fn test_refresh_without_credentials_is_noop() {
        let session = store_with(MemoryCredentialStore::new());
        session.hydrate().await;
        let before = session.snapshot();
        assert_eq!(session.refresh().await, before);
    }
}
