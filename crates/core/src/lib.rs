//! Online Shop Core - Shared types library.
//!
//! This crate provides common types used across all Online Shop components:
//! - `storefront` - Session layer, HTTP adapter, and access guard
//! - `cli` - Command-line front end (`shop-cli`)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, roles, domain records, credentials, and the
//!   error envelope every failure is rendered through

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
