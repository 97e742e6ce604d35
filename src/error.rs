//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Origin URL missing a host, unparseable, or not http(s)
    #[error("Invalid origin URL: {0}")]
    InvalidOrigin(String),

    /// Cache capacity of zero or not a number
    #[error("Invalid cache capacity: {0}")]
    InvalidCapacity(String),

    /// Any other startup configuration problem
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Client request body could not be read
    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    /// Origin unreachable or its response could not be read
    #[error("Origin request failed: {0}")]
    Forward(#[from] reqwest::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Forward(_) => StatusCode::BAD_GATEWAY,
            // Configuration errors fail startup and never reach a client.
            ProxyError::InvalidOrigin(_)
            | ProxyError::InvalidCapacity(_)
            | ProxyError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
