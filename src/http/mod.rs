//! HTTP transport for the dispatcher
//!
//! `shim` holds the platform-neutral function boundary; `handlers` adapts axum
//! requests onto it and serves the metadata endpoints.

pub mod handlers;
pub mod shim;
