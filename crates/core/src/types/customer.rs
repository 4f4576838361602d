//! Customer (user) record.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::CustomerId;
use super::order::Order;
use super::status::Role;

/// The hydrated user record returned by `GET /customers/{id}`.
///
/// This is the `user` half of a session: role gating, profile display, and
/// the "my orders" view all read from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Whether `/customers/{id}/image` has a profile picture to serve.
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Orders placed by this customer. Missing and `null` both mean none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub orders: Vec<Order>,
}

impl Customer {
    /// Whether this customer holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Order>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Order>>::deserialize(deserializer)?.unwrap_or_default())
}
