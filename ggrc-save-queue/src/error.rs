//! Save queue error types.

use ggrc_client::ClientError;
use ggrc_models::ModelError;
use serde_json::Value;
use thiserror::Error;

/// Result type observed through a save receipt.
pub type SaveResult<T> = Result<T, SaveError>;

/// Reasons a queued save can fail. Every variant reaches the caller only
/// through the receipt of the object it concerns.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server rejected object with status {status}: {body}")]
    Rejected { status: u16, body: Value },

    #[error("malformed response entry: {0:?}")]
    MalformedEntry(Option<Value>),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("validation failed: {0}")]
    Invalid(ModelError),

    #[error("save was dropped before it settled")]
    Abandoned,
}

impl SaveError {
    /// Maps a request-level client failure to the error every object of
    /// that request is rejected with.
    pub fn from_client(err: &ClientError) -> Self {
        match err {
            ClientError::Status { status, body } => Self::Rejected {
                status: *status,
                body: serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone())),
            },
            other => Self::Transport(other.to_string()),
        }
    }

    /// Status code attached to the failure, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
