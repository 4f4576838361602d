//! Access guard for protected views.
//!
//! [`decide`] is a pure function of a session snapshot and an optional role
//! requirement. [`RouteGuard`] pairs a requirement with a login path and turns
//! decisions into outcomes a front end can act on.
//!
//! # Example
//!
//! ```rust,ignore
//! let guard = RouteGuard::require_roles([Role::Admin]);
//! match guard.resolve(&mut session.subscribe()).await {
//!     GuardOutcome::Render => show_orders().await?,
//!     GuardOutcome::RedirectToLogin(path) => redirect(&path),
//!     GuardOutcome::Forbidden(envelope) => render_failure(&envelope),
//!     GuardOutcome::Loading => unreachable_while_resolving(),
//! }
//! ```

use onlineshop_core::{ErrorEnvelope, Role};
use tokio::sync::watch;

use crate::session::SessionSnapshot;

/// Default entry point unauthenticated users are sent to.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Result of checking a session against a view's requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Hydration is still running; show a loading state, do not redirect.
    Pending,
    /// Nobody is logged in.
    DenyUnauthenticated,
    /// Logged in, but the role is not among the required ones.
    DenyForbidden,
    /// Render the view.
    Allow,
}

/// Decide whether `snapshot` may see a view requiring `required_roles`.
///
/// Checks run in a fixed order: loading, then authentication, then role.
/// `None` means any logged-in user; an empty list admits nobody.
#[must_use]
pub fn decide(snapshot: &SessionSnapshot, required_roles: Option<&[Role]>) -> AccessDecision {
    if snapshot.loading {
        return AccessDecision::Pending;
    }
    let Some(user) = &snapshot.user else {
        return AccessDecision::DenyUnauthenticated;
    };
    match required_roles {
        Some(roles) if !roles.contains(&user.role) => AccessDecision::DenyForbidden,
        _ => AccessDecision::Allow,
    }
}

/// What the front end should do for a guarded view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Show a loading indicator.
    Loading,
    /// Render the protected view.
    Render,
    /// Send the user to the login entry point.
    RedirectToLogin(String),
    /// Show the failure view with this 403 envelope. Not a redirect.
    Forbidden(ErrorEnvelope),
}

/// Role requirement for one view plus where to send anonymous users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    required_roles: Option<Vec<Role>>,
    login_path: String,
}

impl RouteGuard {
    /// Any logged-in user may pass.
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            required_roles: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Only users holding one of `roles` may pass.
    #[must_use]
    pub fn require_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            required_roles: Some(roles.into_iter().collect()),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Override the login entry point.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// The role requirement, if any.
    #[must_use]
    pub fn required_roles(&self) -> Option<&[Role]> {
        self.required_roles.as_deref()
    }

    /// Decision for one snapshot.
    #[must_use]
    pub fn decide(&self, snapshot: &SessionSnapshot) -> AccessDecision {
        decide(snapshot, self.required_roles())
    }

    /// Outcome for one snapshot.
    #[must_use]
    pub fn check(&self, snapshot: &SessionSnapshot) -> GuardOutcome {
        match self.decide(snapshot) {
            AccessDecision::Pending => GuardOutcome::Loading,
            AccessDecision::DenyUnauthenticated => {
                GuardOutcome::RedirectToLogin(self.login_path.clone())
            }
            AccessDecision::DenyForbidden => {
                tracing::debug!(
                    role = ?snapshot.role(),
                    required = ?self.required_roles,
                    "Access denied"
                );
                GuardOutcome::Forbidden(ErrorEnvelope::forbidden())
            }
            AccessDecision::Allow => GuardOutcome::Render,
        }
    }

    /// Wait until the session settles, then return the outcome.
    ///
    /// Never returns [`GuardOutcome::Loading`] unless the session store was
    /// dropped mid-hydration.
    pub async fn resolve(&self, session: &mut watch::Receiver<SessionSnapshot>) -> GuardOutcome {
        if session.wait_for(|snapshot| !snapshot.loading).await.is_err() {
            tracing::warn!("Session store dropped before hydration finished");
        }
        let snapshot = session.borrow().clone();
        self.check(&snapshot)
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::authenticated()
    }
}
