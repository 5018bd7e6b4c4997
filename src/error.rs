//! Error types for the loan worker
//!
//! One failure taxonomy for the whole handling pass: payload parsing, task
//! field extraction, currency conversion, and workflow backend calls all
//! surface here and map to an HTTP status for the webhook response.

use thiserror::Error;
use warp::http::StatusCode;

/// Main error type for webhook handling operations
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Malformed webhook payload: {message}")]
    MalformedPayload { message: String },

    #[error("Missing required field '{code}' on task")]
    MissingRequiredField { code: String },

    #[error("Unsupported currency '{code}'")]
    UnsupportedCurrency { code: String },

    #[error("Rate lookup failed: {message}")]
    RateLookupFailed { message: String },

    #[error("Workflow backend call failed: {message}")]
    BackendCallFailed { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl WorkerError {
    /// Create malformed payload error
    pub fn malformed_payload<S: Into<String>>(message: S) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create missing required field error
    pub fn missing_required_field<S: Into<String>>(code: S) -> Self {
        Self::MissingRequiredField { code: code.into() }
    }

    /// Create unsupported currency error
    pub fn unsupported_currency<S: Into<String>>(code: S) -> Self {
        Self::UnsupportedCurrency { code: code.into() }
    }

    /// Create rate lookup error
    pub fn rate_lookup_failed<S: Into<String>>(message: S) -> Self {
        Self::RateLookupFailed {
            message: message.into(),
        }
    }

    /// Create backend call error
    pub fn backend_call_failed<S: Into<String>>(message: S) -> Self {
        Self::BackendCallFailed {
            message: message.into(),
        }
    }

    /// HTTP status reported to the delivering platform.
    ///
    /// Unparseable payloads are the caller's fault; external-dependency
    /// failures are bad gateways; everything else is an internal failure of
    /// the handling pass.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkerError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            WorkerError::RateLookupFailed { .. } | WorkerError::BackendCallFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            WorkerError::MissingRequiredField { .. }
            | WorkerError::UnsupportedCurrency { .. }
            | WorkerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;
