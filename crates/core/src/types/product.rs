//! Catalog product record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as returned by `GET /products` and `GET /products/{id}`.
///
/// Image bytes are served separately from `/products/{id}/image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub supplier: String,
    /// Unit price in the shop's currency.
    pub price: Decimal,
}
