//! HTTP API layer for civica.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: citizen and official surfaces
//! - **Extractors**: authentication and the officials-only gate
//! - **Middleware**: bearer-token resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
