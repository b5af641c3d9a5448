//! Error types for Textframe
//!
//! Every fallible path in the crate funnels into [`TextframeError`], which
//! knows its own HTTP status so route handlers never pick codes ad hoc.

use hyper::StatusCode;

/// Main error type for Textframe operations
#[derive(Debug, thiserror::Error)]
pub enum TextframeError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication failed. The payload is for logs only and must never
    /// reach a response body.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timeout: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TextframeError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable kind used as the `error` field of JSON bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Bad Request",
            Self::Unauthorized(_) => "Unauthorized",
            Self::NotFound(_) => "Not Found",
            Self::Upstream(_) => "Bad Gateway",
            Self::Timeout(_) => "Gateway Timeout",
            Self::Database(_) => "Service Unavailable",
            Self::Internal(_) | Self::Config(_) => "Internal Server Error",
        }
    }

    /// Message that is safe to show to the client.
    ///
    /// Authentication failures collapse to a single fixed string so callers
    /// cannot tell an unknown identity from a bad signature or a spent nonce.
    /// Storage and internal faults never expose driver text.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => "Invalid credentials".to_string(),
            Self::Database(_) => "Storage unavailable".to_string(),
            Self::Internal(_) | Self::Config(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures caused by the transcript or generation upstreams
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Timeout(_))
    }
}

impl From<std::io::Error> for TextframeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for TextframeError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for TextframeError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for TextframeError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<reqwest::Error> for TextframeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

/// Result type alias for Textframe operations
pub type Result<T> = std::result::Result<T, TextframeError>;
