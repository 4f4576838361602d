//! Customer and user-administration endpoints.

use onlineshop_core::{Customer, CustomerId};
use secrecy::SecretString;
use serde::Serialize;
use tracing::instrument;

use super::auth::RegisterResponse;
use super::{ApiClient, ApiError, Binary, ImageUpload, json_multipart};

/// Body of the JSON part in `PUT /customers/updateById/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCustomerRequest {
    pub username: String,
    pub phone: String,
    pub address: String,
}

/// Body of `POST /admin/add`.
#[derive(Debug, Clone, Serialize)]
pub struct AddAdminRequest {
    pub username: String,
    pub phone: String,
    pub address: String,
}

impl ApiClient {
    /// Fetch a customer record using the persisted bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, ApiError> {
        self.send_json(self.get(&format!("/customers/{id}"))).await
    }

    /// Fetch a customer record with a token that has not been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, token), fields(customer_id = %id))]
    pub async fn get_customer_with_token(
        &self,
        id: CustomerId,
        token: &SecretString,
    ) -> Result<Customer, ApiError> {
        let request = self.request_with_token(reqwest::Method::GET, &format!("/customers/{id}"), token);
        self.send_json(request).await
    }

    /// List every customer (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.send_json(self.get("/customers")).await
    }

    /// Fetch a customer's profile picture.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn customer_image(&self, id: CustomerId) -> Result<Binary, ApiError> {
        self.send_bytes(self.get(&format!("/customers/{id}/image"))).await
    }

    /// Download the customer list as a PDF report (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn customers_report(&self) -> Result<Binary, ApiError> {
        self.send_bytes(self.get("/customers/report")).await
    }

    /// Update a customer's profile, optionally replacing the picture.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the form cannot be built.
    #[instrument(skip(self, request, image), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        request: &UpdateCustomerRequest,
        image: Option<ImageUpload>,
    ) -> Result<String, ApiError> {
        let form = json_multipart("updateCustomerRequest", request, image)?;
        self.send_text(self.put(&format!("/customers/updateById/{id}")).multipart(form))
            .await
    }

    /// Delete a customer (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<String, ApiError> {
        self.send_text(self.delete(&format!("/customers/deleteById/{id}")))
            .await
    }

    /// Create an admin account (admin). Returns the backend's message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn add_admin(&self, request: &AddAdminRequest) -> Result<String, ApiError> {
        let response: RegisterResponse = self.send_json(self.post("/admin/add").json(request)).await?;
        Ok(response.message)
    }
}
