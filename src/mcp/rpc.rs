//! JSON-RPC envelope representations and formatting utilities
//!
//! Every response leaves through [`ResponseEnvelope`], which carries exactly one
//! of `result` or `error` and always reports `jsonrpc: "2.0"`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound request as decoded from the HTTP body.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    /// `None` when the key is absent, `Some(Value::Null)` for an explicit `null`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub id: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(ErrorObject),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub jsonrpc: &'static str,
    #[serde(flatten)]
    pub payload: ResponsePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("jsonrpc response serialization")
    }
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> ResponseEnvelope {
    ResponseEnvelope {
        jsonrpc: JSONRPC_VERSION,
        payload: ResponsePayload::Result(result),
        id,
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: impl Into<String>) -> ResponseEnvelope {
    ResponseEnvelope {
        jsonrpc: JSONRPC_VERSION,
        payload: ResponsePayload::Error(ErrorObject {
            code,
            message: message.into(),
        }),
        id,
    }
}

pub fn rpc_error_response(id: Option<Value>, err: &RpcError) -> ResponseEnvelope {
    json_rpc_error(id, err.code(), err.to_string())
}
