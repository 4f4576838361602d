//! Order record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::product::Product;
use super::status::OrderStatus;

/// An order as returned by `/orders*` and embedded in a customer record.
///
/// The backend serializes the owning customer as a back-reference and omits
/// it from the embedded form, so it is not modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Local date-time the order was placed.
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    pub city: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub product: Option<Product>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_with_embedded_product() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 10,
                "date": "2025-03-01T12:30:00",
                "city": "Izmir",
                "status": "SHIPPED",
                "product": {"id": 1, "name": "Mug", "supplier": "Acme", "price": 9}
            }"#,
        )
        .unwrap();

        assert_eq!(order.id, OrderId::new(10));
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.product.unwrap().name, "Mug");
        assert!(order.date.is_some());
    }

    #[test]
    fn test_order_minimal() {
        let order: Order = serde_json::from_str(r#"{"id": 1, "city": "Ankara"}"#).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.product.is_none());
        assert!(order.date.is_none());
    }
}
