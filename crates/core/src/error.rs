//! Error types for the Citegate gateway.
//!
//! This module defines a unified error enum covering every failure category
//! in the pipeline. The two upstream stages (retrieval and generation) have
//! dedicated variants because their failures are counted per stage and abort
//! the request; telemetry failures are absorbed and never reach this enum
//! from a handler.

use thiserror::Error;

/// Unified error type for the Citegate gateway.
///
/// All functions in the pipeline return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Retrieval service errors (unreachable, non-success status, malformed payload)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Generation backend errors (unreachable, non-success status, malformed completion)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Prompt assembly errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Telemetry registry errors (startup only, never per-request)
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<prometheus::Error> for AppError {
    fn from(err: prometheus::Error) -> Self {
        AppError::Telemetry(err.to_string())
    }
}

impl AppError {
    /// Stage label used by the per-stage error counter, if this error
    /// belongs to a counted pipeline stage.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            AppError::Retrieval(_) => Some("retriever"),
            AppError::Generation(_) => Some("generation"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
