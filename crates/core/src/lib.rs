//! Core business logic for foodbook-rs.

pub mod services;

pub use services::*;
