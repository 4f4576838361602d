//! Online Shop storefront library.
//!
//! The session and API-access layer of the shop client:
//!
//! - [`api`] - HTTP client adapter with bearer injection and typed endpoints
//! - [`storage`] - Persisted `token` + `userId` credentials
//! - [`session`] - Hydrate / login / logout / refresh with observable snapshots
//! - [`guard`] - Role-based access decisions for protected views
//! - [`error`] - Uniform error envelope and Sentry helpers
//! - [`screen`] - Failure view, mount scope, and fan-in loading
//! - [`context`] - One `ShopContext` per process tying it together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod screen;
pub mod session;
pub mod storage;

pub use context::ShopContext;
