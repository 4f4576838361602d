//! CLI command implementations.

pub mod customers;
pub mod orders;
pub mod products;
pub mod session;

use std::path::{Path, PathBuf};

use onlineshop_core::{Customer, ErrorEnvelope};
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::api::{ApiError, ImageUpload};
use onlineshop_storefront::error::ClientError;
use onlineshop_storefront::guard::{GuardOutcome, RouteGuard};
use onlineshop_storefront::session::AuthError;
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Session, guard, or backend failure.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A local file could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        Self::Client(e.into())
    }
}

impl From<AuthError> for CliError {
    fn from(e: AuthError) -> Self {
        Self::Client(e.into())
    }
}

impl CliError {
    /// The uniform envelope rendered by the failure view.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Client(e) => e.envelope(),
            Self::File { .. } => ErrorEnvelope::new(None, self.to_string(), None),
        }
    }

    /// Capture unexpected failures to Sentry and log them.
    pub fn report(&self) {
        match self {
            Self::Client(e) => e.report(),
            Self::File { .. } => tracing::debug!(error = %self, "Local file error"),
        }
    }
}

/// Hydrate the session and run the guard for a view.
///
/// Returns the logged-in user when the view may render.
pub async fn enter(context: &ShopContext, guard: &RouteGuard) -> Result<Customer, CliError> {
    context.session().hydrate().await;

    match guard.resolve(&mut context.session().subscribe()).await {
        GuardOutcome::Render => context
            .session()
            .current_user()
            .ok_or_else(|| ClientError::Unauthenticated.into()),
        GuardOutcome::RedirectToLogin(path) => {
            tracing::info!("Not logged in ({path}). Run `shop-cli login` first.");
            Err(ClientError::Unauthenticated.into())
        }
        GuardOutcome::Forbidden(_) => Err(ClientError::Forbidden.into()),
        GuardOutcome::Loading => Err(ClientError::Unauthenticated.into()),
    }
}

/// Read a file to upload as an image.
pub fn read_upload(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(ImageUpload::from_bytes(file_name, bytes))
}

/// Write downloaded bytes to `path`.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Log one customer record.
pub fn show_customer(customer: &Customer) {
    tracing::info!(
        "#{} {} [{}] phone: {} address: {}",
        customer.id,
        customer.username,
        customer.role,
        customer.phone.as_deref().unwrap_or("-"),
        customer.address.as_deref().unwrap_or("-"),
    );
}
