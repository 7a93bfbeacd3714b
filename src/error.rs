//! Unified client error model.
//! Every call site (dispatch, login, resource clients) surfaces exactly one `ApiError`,
//! carrying a human-readable message and, where the server answered, the status and body.

use serde::Serialize;
use thiserror::Error;

use crate::normalize::Payload;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error: could not reach API";

#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiError {
    /// The transport never produced a response.
    #[error("{message}")]
    Network { message: String, cause: String },
    /// The server answered with a failure status.
    #[error("{message}")]
    Http { status: u16, message: String, body: Payload, url: String },
    /// A success status whose body lacked what the caller needed.
    #[error("{message}")]
    Protocol { message: String },
    /// Startup-time configuration could not be resolved.
    #[error("{message}")]
    Config { message: String },
}

impl ApiError {
    pub fn network<S: Into<String>>(cause: S) -> Self {
        ApiError::Network { message: NETWORK_ERROR_MESSAGE.to_string(), cause: cause.into() }
    }
    pub fn http<S: Into<String>>(status: u16, message: S, body: Payload, url: S) -> Self {
        ApiError::Http { status, message: message.into(), body, url: url.into() }
    }
    pub fn protocol<S: Into<String>>(msg: S) -> Self { ApiError::Protocol { message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { ApiError::Config { message: msg.into() } }

    pub fn code_str(&self) -> &'static str {
        match self {
            ApiError::Network { .. } => "network_error",
            ApiError::Http { .. } => "http_error",
            ApiError::Protocol { .. } => "protocol_error",
            ApiError::Config { .. } => "config_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message, .. }
            | ApiError::Http { message, .. }
            | ApiError::Protocol { message }
            | ApiError::Config { message } => message.as_str(),
        }
    }

    /// HTTP status when the server responded; `None` for transport and local failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed-or-raw response body for diagnostic display.
    pub fn body(&self) -> Option<&Payload> {
        match self {
            ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_route_not_found(&self) -> bool { self.status() == Some(404) }
    pub fn is_method_not_allowed(&self) -> bool { self.status() == Some(405) }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: anything untyped is treated as a protocol problem
        ApiError::Protocol { message: err.to_string() }
    }
}
