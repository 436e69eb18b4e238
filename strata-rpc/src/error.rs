//! Error types for the RPC gateway.

use thiserror::Error;

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors from the PostgREST gateway layer.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("gateway error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The endpoint is not a usable base URL.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    Endpoint {
        /// The endpoint as given.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The response body was not valid JSON.
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Create an endpoint error.
    pub fn endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Endpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status, when the gateway answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the gateway reported that the function does not exist.
    pub fn is_missing_function(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
