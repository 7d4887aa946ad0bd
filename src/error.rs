//! Error taxonomy shared by the registry and source-hub clients.
//!
//! Every error is caught at the tool-call boundary and converted into a
//! structured error result; nothing propagates to the MCP caller as an
//! uncaught fault.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("unauthorized - check the API token")]
    Unauthorized,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid JSON response: {0}")]
    Json(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Stable machine-readable error kind carried in tool results.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Transport(_) => "transport_error",
            ApiError::Json(_) => "json_error",
            ApiError::Unexpected(_) => "unexpected_error",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            ApiError::Transport(error.to_string())
        } else {
            ApiError::Unexpected(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Json(error.to_string())
    }
}
