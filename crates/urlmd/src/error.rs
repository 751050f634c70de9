//! Error types for urlmd

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised by a [`ConversionEngine`](crate::ConversionEngine)
///
/// The message carries only the detail; the category prefix is added
/// when the error is lifted into a [`GatewayError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The content type was recognized but no converter handles it
    #[error("{0}")]
    UnsupportedFormat(String),

    /// The resource was reached but fetching or converting it failed
    #[error("{0}")]
    ConversionFailed(String),

    /// Anything else the engine could not classify
    #[error("{0}")]
    Other(String),
}

impl ConversionError {
    /// Classify a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ConversionError::Other(format!("Failed to create HTTP request: {}", err))
        } else if err.is_timeout() {
            ConversionError::ConversionFailed(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ConversionError::ConversionFailed(format!("Failed to connect to server: {}", err))
        } else if let Some(status) = err.status() {
            ConversionError::ConversionFailed(format!("Upstream returned HTTP {}", status))
        } else {
            ConversionError::ConversionFailed(err.to_string())
        }
    }
}

/// Every way a gateway request can fail, one variant per status code class
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// 415: the engine does not support the resource's format
    #[error("Unsupported URL format: {0}")]
    UnsupportedFormat(String),

    /// 400: the engine tried and failed
    #[error("URL conversion failed: {0}")]
    ConversionFailed(String),

    /// 504: the engine did not answer in time
    #[error("Conversion timed out. Please try again later.")]
    Timeout,

    /// 500: unclassified failure inside the conversion step
    #[error("Internal server error: {0}")]
    Internal(String),

    /// 400: failure outside the conversion step (decode, normalize, validation)
    #[error("URL processing failed: {0}")]
    Processing(String),
}

impl GatewayError {
    /// HTTP status code for this error kind
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            GatewayError::ConversionFailed(_) => StatusCode::BAD_REQUEST,
            GatewayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Processing(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ConversionError> for GatewayError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::UnsupportedFormat(detail) => GatewayError::UnsupportedFormat(detail),
            ConversionError::ConversionFailed(detail) => GatewayError::ConversionFailed(detail),
            ConversionError::Other(detail) => GatewayError::Internal(detail),
        }
    }
}
