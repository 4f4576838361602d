//! Order endpoints.

use onlineshop_core::{CustomerId, Order, OrderId, ProductId};
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, Binary};

/// Body of `POST /orders/buy`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
}

impl ApiClient {
    /// List every order (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.send_json(self.get("/orders")).await
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.send_json(self.get(&format!("/orders/{id}"))).await
    }

    /// Place an order. The backend answers with a plain confirmation message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(customer_id = %request.customer_id, product_id = %request.product_id))]
    pub async fn buy(&self, request: CreateOrderRequest) -> Result<String, ApiError> {
        self.send_text(self.post("orders/buy").json(&request)).await
    }

    /// Cancel (delete) an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: OrderId) -> Result<String, ApiError> {
        self.send_text(self.delete(&format!("/orders/deleteById/{id}")))
            .await
    }

    /// Download the PDF receipt for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_receipt(&self, id: OrderId) -> Result<Binary, ApiError> {
        self.send_bytes(self.get(&format!("/orders/{id}/receipt"))).await
    }
}
