use axum::http::StatusCode;
use thiserror::Error;

/// Failure raised by a capability handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
    #[error("internal error")]
    Internal { message: String },
}

impl AppError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Protocol-level failure of a single dispatched request.
///
/// Each variant knows its JSON-RPC code, the HTTP status the transport shim
/// answers with, and the message that is safe to hand to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("Invalid Request")]
    InvalidRequest,
    #[error("Method '{0}' not found")]
    MethodNotFound(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),
    #[error("Resource '{0}' not found")]
    ResourceNotFound(String),
    #[error("Internal error")]
    Internal,
}

pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

impl RpcError {
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidRequest => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::ToolNotFound(_) | Self::ResourceNotFound(_) => {
                INVALID_PARAMS
            }
            Self::Internal => INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest
            | Self::MethodNotFound(_)
            | Self::InvalidParams(_)
            | Self::ToolNotFound(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AppError> for RpcError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidParams { message } => Self::InvalidParams(message),
            AppError::Internal { message } => {
                tracing::error!(error = %message, "capability handler failed");
                Self::Internal
            }
        }
    }
}
