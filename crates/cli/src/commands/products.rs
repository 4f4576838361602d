//! Catalog commands.

use std::path::{Path, PathBuf};

use onlineshop_core::{ProductId, Role};
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::api::ProductRequest;
use onlineshop_storefront::error::add_breadcrumb;
use onlineshop_storefront::guard::RouteGuard;
use onlineshop_storefront::screen::{
    PLACEHOLDER_IMAGE_URL, ProductImage, ScreenScope, load_product_detail,
};
use rust_decimal::Decimal;

use super::{CliError, enter, read_upload, write_output};

/// Fields of the product add/update form.
pub struct ProductForm {
    pub name: String,
    pub supplier: String,
    pub price: Decimal,
    pub image: Option<PathBuf>,
}

impl ProductForm {
    fn request(&self) -> ProductRequest {
        ProductRequest {
            name: self.name.clone(),
            supplier: self.supplier.clone(),
            price: self.price,
        }
    }
}

/// List the catalog. Public.
pub async fn list(context: &ShopContext) -> Result<(), CliError> {
    context.session().hydrate().await;

    let products = context.api().list_products().await?;
    if products.is_empty() {
        tracing::info!("The catalog is empty");
    }
    for product in &products {
        tracing::info!(
            "#{} {} by {} - {}",
            product.id,
            product.name,
            product.supplier,
            product.price
        );
    }
    Ok(())
}

/// Show a product and its image. Public.
pub async fn show(
    context: &ShopContext,
    id: ProductId,
    image_out: Option<&Path>,
) -> Result<(), CliError> {
    context.session().hydrate().await;
    add_breadcrumb(
        "navigation",
        "Viewed product",
        Some(&[("product_id", id.to_string().as_str())]),
    );

    let scope = ScreenScope::new();
    let Some(detail) = scope.run(load_product_detail(context.api(), id)).await else {
        return Ok(());
    };
    let detail = detail?;

    let product = &detail.product;
    tracing::info!("#{} {}", product.id, product.name);
    tracing::info!("Supplier: {}", product.supplier);
    tracing::info!("Price: {}", product.price);

    match (&detail.image, image_out) {
        (ProductImage::Loaded(image), Some(path)) => write_output(path, &image.bytes)?,
        (ProductImage::Loaded(image), None) => tracing::info!(
            "Image: {} bytes ({})",
            image.bytes.len(),
            image.content_type.as_deref().unwrap_or("unknown type")
        ),
        (ProductImage::Placeholder, _) => {
            tracing::info!("Image: {PLACEHOLDER_IMAGE_URL} (no picture available)");
        }
    }
    Ok(())
}

/// Add a product. Admin only.
pub async fn add(context: &ShopContext, form: ProductForm) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let image = form.image.as_deref().map(read_upload).transpose()?;
    let message = context.api().add_product(&form.request(), image).await?;
    tracing::info!("{message}");
    Ok(())
}

/// Update a product. Admin only.
pub async fn update(context: &ShopContext, id: ProductId, form: ProductForm) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let image = form.image.as_deref().map(read_upload).transpose()?;
    let message = context
        .api()
        .update_product(id, &form.request(), image)
        .await?;
    tracing::info!("{message}");
    Ok(())
}

/// Delete a product. Admin only.
pub async fn delete(context: &ShopContext, id: ProductId) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let message = context.api().delete_product(id).await?;
    tracing::info!("{message}");
    Ok(())
}
