//! The central protocol dispatcher
//!
//! Decodes a request envelope into a closed [`MethodCall`], routes it to the
//! registry, and turns the outcome into a response envelope plus the HTTP
//! status the transport answers with.

use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::http::StatusCode;
use rust_mcp_sdk::schema::{
    Implementation, ServerCapabilities, ServerCapabilitiesResources, ServerCapabilitiesTools,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::errors::{AppError, RpcError};
use crate::mcp::rpc::{
    json_rpc_result, rpc_error_response, RequestEnvelope, ResponseEnvelope, JSONRPC_VERSION,
};
use crate::registry::CapabilityRegistry;

pub const PROTOCOL_VERSION: &str = "0.1";

/// Prefix used by older clients, e.g. `mcp/callTool`.
const LEGACY_METHOD_PREFIX: &str = "mcp/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Init,
    ListTools,
    CallTool,
    ListResources,
    ReadResource,
}

impl Method {
    pub fn parse(name: &str) -> Option<Self> {
        let bare = name.strip_prefix(LEGACY_METHOD_PREFIX).unwrap_or(name);
        match bare {
            "init" => Some(Self::Init),
            "listTools" => Some(Self::ListTools),
            "callTool" => Some(Self::CallTool),
            "listResources" => Some(Self::ListResources),
            "readResource" => Some(Self::ReadResource),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ListTools => "listTools",
            Self::CallTool => "callTool",
            Self::ListResources => "listResources",
            Self::ReadResource => "readResource",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default, alias = "arguments")]
    pub args: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadResourceParams {
    pub uri: String,
}

/// A method together with its validated params.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodCall {
    Init,
    ListTools,
    CallTool(CallToolParams),
    ListResources,
    ReadResource(ReadResourceParams),
}

impl MethodCall {
    pub fn decode(method: Method, params: Option<Value>) -> Result<Self, RpcError> {
        Ok(match method {
            Method::Init => Self::Init,
            Method::ListTools => Self::ListTools,
            Method::ListResources => Self::ListResources,
            Method::CallTool => Self::CallTool(decode_params(params)?),
            Method::ReadResource => Self::ReadResource(decode_params(params)?),
        })
    }
}

fn decode_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    let Some(raw_params) = params else {
        return Err(RpcError::InvalidParams("params are required".to_string()));
    };

    serde_json::from_value(raw_params).map_err(|err| RpcError::InvalidParams(err.to_string()))
}

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub server: Implementation,
    pub protocol: ProtocolInfo,
}

#[derive(Debug, Serialize)]
pub struct ProtocolInfo {
    pub version: &'static str,
    pub capabilities: ServerCapabilities,
}

pub fn init_result() -> InitResult {
    InitResult {
        server: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        protocol: ProtocolInfo {
            version: PROTOCOL_VERSION,
            capabilities: ServerCapabilities {
                logging: Some(Map::new()),
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                resources: Some(ServerCapabilitiesResources {
                    subscribe: Some(false),
                    list_changed: Some(false),
                }),
                prompts: None,
                ..Default::default()
            },
        },
    }
}

/// Runs one decoded request against the registry.
pub fn dispatch(
    registry: &CapabilityRegistry,
    request: &RequestEnvelope,
) -> Result<Value, RpcError> {
    if request
        .jsonrpc
        .as_deref()
        .is_some_and(|version| version != JSONRPC_VERSION)
    {
        return Err(RpcError::InvalidRequest);
    }

    let method = Method::parse(&request.method)
        .ok_or_else(|| RpcError::MethodNotFound(request.method.clone()))?;

    match MethodCall::decode(method, request.params.clone())? {
        MethodCall::Init => Ok(to_result_value(&init_result())),
        MethodCall::ListTools => Ok(json!({ "tools": registry.list_tools() })),
        MethodCall::CallTool(params) => {
            let tool = registry
                .tool(&params.name)
                .ok_or_else(|| RpcError::ToolNotFound(params.name.clone()))?;
            let args = params.args.unwrap_or_default();

            let content = guard_handler(&params.name, || tool.handler.call(args))?;
            Ok(json!({ "content": content }))
        }
        MethodCall::ListResources => Ok(json!({ "resources": registry.list_resources() })),
        MethodCall::ReadResource(params) => {
            let resource = registry
                .resource(&params.uri)
                .ok_or_else(|| RpcError::ResourceNotFound(params.uri.clone()))?;

            let contents = guard_handler(&params.uri, || resource.handler.read(&params.uri))?;
            Ok(json!({ "contents": contents }))
        }
    }
}

/// Runs a capability handler, turning both returned errors and panics into protocol errors.
fn guard_handler<T>(
    capability: &str,
    handler: impl FnOnce() -> Result<T, AppError>,
) -> Result<T, RpcError> {
    match catch_unwind(AssertUnwindSafe(handler)) {
        Ok(result) => result.map_err(RpcError::from),
        Err(_) => {
            tracing::error!(capability = %capability, "capability handler panicked");
            Err(RpcError::Internal)
        }
    }
}

fn to_result_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("result serialization")
}

/// Dispatches a request and builds the envelope, echoing the request `id`.
pub fn handle_request(
    registry: &CapabilityRegistry,
    request: RequestEnvelope,
) -> (StatusCode, ResponseEnvelope) {
    let audit_params = redact_audit_params(request.params.as_ref());

    let (status, response) = match dispatch(registry, &request) {
        Ok(result) => (StatusCode::OK, json_rpc_result(request.id, result)),
        Err(err) => (err.http_status(), rpc_error_response(request.id, &err)),
    };

    info!(
        method = %request.method,
        params = %audit_params,
        outcome = if response.is_error() { "failure" } else { "success" },
        "mcp action audited"
    );

    (status, response)
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_mcp_sdk::schema::{ContentBlock, TextResourceContents};

    use super::*;
    use crate::domain::default_registry;
    use crate::registry::{ResourceDescriptor, ResourceHandler, ToolDescriptor, ToolHandler};

    fn request(method: &str, params: Option<Value>, id: Option<Value>) -> RequestEnvelope {
        RequestEnvelope {
            jsonrpc: Some("2.0".to_string()),
            method: method.to_string(),
            params,
            id,
        }
    }

    fn registry() -> CapabilityRegistry {
        default_registry().expect("default registry builds")
    }

    struct Exploding;

    impl ToolHandler for Exploding {
        fn call(&self, _args: Map<String, Value>) -> Result<Vec<ContentBlock>, AppError> {
            panic!("boom");
        }
    }

    struct Failing;

    impl ResourceHandler for Failing {
        fn read(&self, _uri: &str) -> Result<Vec<TextResourceContents>, AppError> {
            Err(AppError::internal("backing store unavailable"))
        }
    }

    fn faulty_registry() -> CapabilityRegistry {
        CapabilityRegistry::builder()
            .register_tool(ToolDescriptor {
                name: "explode".to_string(),
                description: "always panics".to_string(),
                input_schema: json!({ "type": "object" }),
                handler: Arc::new(Exploding),
            })
            .and_then(|builder| {
                builder.register_resource(ResourceDescriptor {
                    name: "broken".to_string(),
                    uri: "docs://broken".to_string(),
                    metadata: json!({}),
                    handler: Arc::new(Failing),
                })
            })
            .expect("registry builds")
            .build()
    }

    #[test]
    fn parses_bare_and_prefixed_method_names() {
        assert_eq!(Method::parse("init"), Some(Method::Init));
        assert_eq!(Method::parse("mcp/callTool"), Some(Method::CallTool));
        assert_eq!(Method::parse("readResource"), Some(Method::ReadResource));
        assert_eq!(Method::parse("calltool"), None);
        assert_eq!(Method::parse("tools/call"), None);
        assert_eq!(Method::ReadResource.as_str(), "readResource");
    }

    #[test]
    fn call_tool_requires_params_with_name() {
        let missing = MethodCall::decode(Method::CallTool, None).expect_err("params required");
        assert_eq!(missing.code(), -32602);

        let unnamed = MethodCall::decode(Method::CallTool, Some(json!({ "args": {} })))
            .expect_err("name required");
        assert_eq!(unnamed.code(), -32602);
    }

    #[test]
    fn call_tool_accepts_arguments_alias() {
        let call = MethodCall::decode(
            Method::CallTool,
            Some(json!({ "name": "run-analysis-report", "arguments": { "days": 2 } })),
        )
        .expect("valid params");

        let MethodCall::CallTool(params) = call else {
            panic!("expected callTool");
        };
        assert_eq!(params.args.expect("args")["days"], 2);
    }

    #[test]
    fn init_ignores_params() {
        let registry = registry();
        let result = dispatch(
            &registry,
            &request("init", Some(json!({ "anything": [1, 2, 3] })), Some(json!(1))),
        )
        .expect("init succeeds");

        assert_eq!(result["server"]["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(result["server"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(result["protocol"]["version"], PROTOCOL_VERSION);
        assert!(result["protocol"]["capabilities"]["logging"].is_object());
        assert!(result["protocol"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn list_tools_reports_schema() {
        let registry = registry();
        let result = dispatch(&registry, &request("listTools", None, Some(json!(1))))
            .expect("listTools succeeds");

        assert_eq!(result["tools"][0]["name"], "run-analysis-report");
        assert!(result["tools"][0]["schema"].is_object());
        assert!(result["tools"][0]["description"].is_string());
    }

    #[test]
    fn list_resources_reports_metadata() {
        let registry = registry();
        let result = dispatch(&registry, &request("mcp/listResources", None, None))
            .expect("listResources succeeds");

        assert_eq!(
            result["resources"],
            json!([{
                "name": "interpreting-reports",
                "uri": "docs://interpreting-reports",
                "metadata": { "mimeType": "text/plain" }
            }])
        );
    }

    #[test]
    fn unknown_method_is_reported() {
        let registry = registry();
        let err = dispatch(&registry, &request("shutdown", None, Some(json!(9))))
            .expect_err("unknown method");
        assert_eq!(err, RpcError::MethodNotFound("shutdown".to_string()));
    }

    #[test]
    fn wrong_jsonrpc_version_is_invalid_request() {
        let registry = registry();
        let mut envelope = request("init", None, Some(json!(1)));
        envelope.jsonrpc = Some("1.0".to_string());

        let err = dispatch(&registry, &envelope).expect_err("wrong version");
        assert_eq!(err.code(), -32600);
    }

    #[test]
    fn unknown_resource_returns_404_status() {
        let registry = registry();
        let (status, response) = handle_request(
            &registry,
            request(
                "readResource",
                Some(json!({ "uri": "docs://missing" })),
                Some(json!("r1")),
            ),
        );

        assert_eq!(status, StatusCode::NOT_FOUND);
        let value = response.to_value();
        assert_eq!(value["error"]["code"], -32602);
        assert_eq!(value["error"]["message"], "Resource 'docs://missing' not found");
        assert_eq!(value["id"], "r1");
    }

    #[test]
    fn tool_panic_becomes_internal_error_with_echoed_id() {
        let registry = faulty_registry();
        let (status, response) = handle_request(
            &registry,
            request("callTool", Some(json!({ "name": "explode" })), Some(json!(5))),
        );

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let value = response.to_value();
        assert_eq!(value["error"]["code"], -32603);
        assert_eq!(value["error"]["message"], "Internal error");
        assert_eq!(value["id"], 5);
    }

    #[test]
    fn resource_failure_does_not_leak_detail() {
        let registry = faulty_registry();
        let (_, response) = handle_request(
            &registry,
            request("readResource", Some(json!({ "uri": "docs://broken" })), Some(json!(6))),
        );

        let value = response.to_value();
        assert_eq!(value["error"]["code"], -32603);
        assert!(!value.to_string().contains("backing store"));
    }

    #[test]
    fn tool_argument_errors_are_invalid_params() {
        let registry = registry();
        let (status, response) = handle_request(
            &registry,
            request(
                "callTool",
                Some(json!({ "name": "run-analysis-report", "args": { "days": -1 } })),
                Some(json!(3)),
            ),
        );

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response.to_value()["error"]["code"], -32602);
    }

    #[test]
    fn redacts_sensitive_fields_in_audit_params() {
        let params = json!({
            "name": "run-analysis-report",
            "args": {
                "days": 3,
                "token": "should-not-appear",
                "nested": { "client_secret": "should-not-appear" }
            }
        });

        let redacted = redact_audit_params(Some(&params));

        assert_eq!(redacted["name"], json!("run-analysis-report"));
        assert_eq!(redacted["args"]["days"], json!(3));
        assert_eq!(redacted["args"]["token"], json!("[REDACTED]"));
        assert_eq!(
            redacted["args"]["nested"]["client_secret"],
            json!("[REDACTED]")
        );
    }
}
