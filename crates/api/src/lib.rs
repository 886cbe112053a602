//! HTTP API layer for afrec.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: accounts, devices, issue requests, administration
//! - **Extractors**: authentication and staff guards
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
