//! Core types for the Online Shop client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod customer;
pub mod envelope;
pub mod id;
pub mod order;
pub mod product;
pub mod status;

pub use credential::Credentials;
pub use customer::Customer;
pub use envelope::{BlankMessageError, ErrorBody, ErrorEnvelope};
pub use id::*;
pub use order::Order;
pub use product::Product;
pub use status::*;
