//! Product catalog endpoints.

use onlineshop_core::{Product, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, Binary, ImageUpload, json_multipart};

/// Body of the JSON part in product create/update forms.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRequest {
    pub name: String,
    pub supplier: String,
    pub price: Decimal,
}

impl ApiClient {
    /// List the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.send_json(self.get("/products")).await
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.send_json(self.get(&format!("/products/{id}"))).await
    }

    /// Fetch a product's image bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, including 404 for products
    /// without an image.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_image(&self, id: ProductId) -> Result<Binary, ApiError> {
        self.send_bytes(self.get(&format!("/products/{id}/image"))).await
    }

    /// Create a product (admin). Returns the backend's confirmation text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the form cannot be built.
    #[instrument(skip(self, request, image), fields(name = %request.name))]
    pub async fn add_product(
        &self,
        request: &ProductRequest,
        image: Option<ImageUpload>,
    ) -> Result<String, ApiError> {
        let form = json_multipart("addProductRequest", request, image)?;
        self.send_text(self.post("/products/add").multipart(form)).await
    }

    /// Update a product (admin). Returns the backend's confirmation text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the form cannot be built.
    #[instrument(skip(self, request, image), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        request: &ProductRequest,
        image: Option<ImageUpload>,
    ) -> Result<String, ApiError> {
        let form = json_multipart("updateProductRequest", request, image)?;
        self.send_text(self.put(&format!("/products/updateById/{id}")).multipart(form))
            .await
    }

    /// Delete a product (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<String, ApiError> {
        self.send_text(self.delete(&format!("/products/deleteById/{id}")))
            .await
    }
}
