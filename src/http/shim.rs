//! Function-style transport boundary around the dispatcher
//!
//! A [`FunctionEvent`] is one inbound invocation (HTTP verb plus raw body); a
//! [`FunctionResponse`] is what the hosting platform sends back. Verb checks,
//! body decoding and the outermost panic boundary live here so the dispatcher
//! only ever sees well-formed envelopes.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::http::{header, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::errors::INTERNAL_ERROR;
use crate::mcp::rpc::{json_rpc_error, RequestEnvelope};
use crate::mcp::server::handle_request;
use crate::registry::CapabilityRegistry;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const INVALID_BODY_MESSAGE: &str = "Invalid JSON body";

#[derive(Debug, Clone)]
pub struct FunctionEvent {
    pub http_method: Method,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FunctionResponse {
    fn json(status: StatusCode, body: &Value) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: BTreeMap::from([(
                header::CONTENT_TYPE.as_str().to_string(),
                JSON_CONTENT_TYPE.to_string(),
            )]),
            body: body.to_string(),
        }
    }

    fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: BTreeMap::new(),
            body: body.to_string(),
        }
    }
}

/// Handles one invocation end to end.
pub fn handle_event(registry: &CapabilityRegistry, event: FunctionEvent) -> FunctionResponse {
    if event.http_method != Method::POST {
        return FunctionResponse::text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    let request: RequestEnvelope = match event
        .body
        .as_deref()
        .map(serde_json::from_str::<RequestEnvelope>)
    {
        Some(Ok(request)) => request,
        Some(Err(err)) => {
            warn!(error = %err, "rejecting request body");
            return invalid_body();
        }
        None => {
            warn!("rejecting request without body");
            return invalid_body();
        }
    };

    match catch_unwind(AssertUnwindSafe(|| handle_request(registry, request))) {
        Ok((status, response)) => FunctionResponse::json(status, &response.to_value()),
        Err(_) => {
            error!("request dispatch panicked");
            internal_server_error()
        }
    }
}

fn invalid_body() -> FunctionResponse {
    FunctionResponse::json(
        StatusCode::BAD_REQUEST,
        &json!({ "error": INVALID_BODY_MESSAGE }),
    )
}

/// The original request id may be unrecoverable here, so it is reported as `""`.
pub fn internal_server_error() -> FunctionResponse {
    let envelope = json_rpc_error(
        Some(Value::String(String::new())),
        INTERNAL_ERROR,
        "Internal server error",
    );
    FunctionResponse::json(StatusCode::INTERNAL_SERVER_ERROR, &envelope.to_value())
}
