//! HTTP Handlers
//!
//! Axum routers and handlers for the REST API.

pub mod allocations;
