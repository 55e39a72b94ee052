//! Model error types.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by model objects while validating or ingesting server data.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{field} {message}")]
    Validation { field: &'static str, message: String },

    #[error("server payload missing field: {0}")]
    MissingField(&'static str),

    #[error("object has not been assigned an id yet")]
    Unsaved,

    #[error("deferred binding failed: {0}")]
    Binding(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
