//! Axum HTTP handlers for the web server
//!
//! Provides the protocol endpoint, which forwards to the transport shim, and
//! general metadata endpoints.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::http::shim::{handle_event, internal_server_error, FunctionEvent, FunctionResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
    })
}

pub async fn mcp_endpoint(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    let body = if body.is_empty() {
        None
    } else {
        String::from_utf8(body.to_vec()).ok()
    };

    let event = FunctionEvent {
        http_method: method,
        body,
    };

    into_http_response(handle_event(&state.registry, event))
}

pub fn into_http_response(response: FunctionResponse) -> Response {
    let Ok(status) = StatusCode::from_u16(response.status_code) else {
        error!(status = response.status_code, "shim produced invalid status code");
        return into_http_response(internal_server_error());
    };

    let mut http_response = (status, Body::from(response.body)).into_response();
    for (name, value) in response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                http_response.headers_mut().insert(name, value);
            }
            _ => error!(header = %name, "dropping invalid response header"),
        }
    }

    http_response
}
