//! HTTP API layer for foodbook-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, users, tags, ingredients, recipes
//! - **Extractors**: authentication, pagination
//! - **Middleware**: bearer-token resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
