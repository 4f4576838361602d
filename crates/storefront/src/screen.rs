//! Helpers for screens that load data through the API.
//!
//! - [`FailureView`] is the shared rendering of an [`ErrorEnvelope`].
//! - [`ScreenScope`] discards results that arrive after a screen went away.
//! - [`load_product_detail`] fans out the product and its image together and
//!   falls back to a placeholder when only the image fails.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use onlineshop_core::{ErrorEnvelope, Product, ProductId};

use crate::api::{ApiClient, ApiError, Binary};

/// Image shown when a product has no retrievable picture.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/150";

/// Where the failure view's back action leads.
pub const FAILURE_BACK_PATH: &str = "/products";

const FAILURE_HEADLINE: &str = "An Error Occurred";
const FALLBACK_MESSAGE: &str = "An unknown error occurred.";

// ─────────────────────────────────────────────────────────────────────────────
// Failure View
// ─────────────────────────────────────────────────────────────────────────────

/// The shared failure view: headline, optional status line, message, and a
/// way back to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureView {
    pub headline: &'static str,
    /// `Error code: <status>` when the status is known.
    pub status_line: Option<String>,
    pub message: String,
    pub back_path: &'static str,
}

impl FailureView {
    /// Build the view for an envelope.
    #[must_use]
    pub fn new(envelope: &ErrorEnvelope) -> Self {
        let message = envelope.message().trim();
        Self {
            headline: FAILURE_HEADLINE,
            status_line: envelope.status.map(|status| format!("Error code: {status}")),
            message: if message.is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                message.to_string()
            },
            back_path: FAILURE_BACK_PATH,
        }
    }
}

impl From<&ErrorEnvelope> for FailureView {
    fn from(envelope: &ErrorEnvelope) -> Self {
        Self::new(envelope)
    }
}

impl std::fmt::Display for FailureView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.headline)?;
        if let Some(status_line) = &self.status_line {
            writeln!(f, "{status_line}")?;
        }
        writeln!(f, "{}", self.message)?;
        write!(f, "Go back: {}", self.back_path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Screen Scope
// ─────────────────────────────────────────────────────────────────────────────

/// Mount flag for one screen instance.
///
/// In-flight requests are not cancelled when a screen goes away; their
/// results are dropped instead of being applied to a screen nobody sees.
#[derive(Debug, Clone)]
pub struct ScreenScope {
    mounted: Arc<AtomicBool>,
}

impl ScreenScope {
    /// A freshly mounted screen.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether the screen is still showing.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Mark the screen as gone. Affects every clone.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    /// Await `future` and return its output only if the screen is still
    /// mounted when it completes.
    pub async fn run<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future,
    {
        let output = future.await;
        if self.is_mounted() {
            Some(output)
        } else {
            tracing::debug!("Discarding result for unmounted screen");
            None
        }
    }
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Product Detail
// ─────────────────────────────────────────────────────────────────────────────

/// A product picture, or the placeholder when it could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductImage {
    Loaded(Binary),
    Placeholder,
}

impl ProductImage {
    /// Placeholder URL when no image was loaded.
    #[must_use]
    pub const fn placeholder_url(&self) -> Option<&'static str> {
        match self {
            Self::Loaded(_) => None,
            Self::Placeholder => Some(PLACEHOLDER_IMAGE_URL),
        }
    }
}

/// Everything the product detail screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetailView {
    pub product: Product,
    pub image: ProductImage,
}

/// Load a product and its image concurrently.
///
/// The screen settles only after both requests finish, in whichever order
/// they complete. An image failure degrades to the placeholder.
///
/// # Errors
///
/// Returns the product request's error; image errors never propagate.
pub async fn load_product_detail(
    api: &ApiClient,
    id: ProductId,
) -> Result<ProductDetailView, ApiError> {
    let (product, image) = tokio::join!(api.get_product(id), api.product_image(id));

    let image = match image {
        Ok(binary) => ProductImage::Loaded(binary),
        Err(e) => {
            tracing::debug!(product_id = %id, error = %e, "Product image unavailable, using placeholder");
            ProductImage::Placeholder
        }
    };

    Ok(ProductDetailView {
        product: product?,
        image,
    })
}
