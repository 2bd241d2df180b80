use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod registry;

use registry::CapabilityRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CapabilityRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/mcp", any(http::handlers::mcp_endpoint))
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
