//! The operations the save queue invokes on a model object.

use crate::error::ModelResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to another object by type and id, as the API embeds it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stub {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Stub {
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }
}

/// A model object that can be saved through the queue.
///
/// Objects are shared as `Arc<dyn Cacheable>` between the caller and the
/// queue, so state changes go through `&self`.
#[async_trait]
pub trait Cacheable: Send + Sync {
    /// Singular resource name, used as the wrapper key (`"threat"`).
    fn table_singular(&self) -> &str;

    /// Plural resource name, used as the endpoint (`"threats"`).
    fn table_plural(&self) -> &str;

    /// Server-assigned id, `None` until the object is persisted.
    fn id(&self) -> Option<i64>;

    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Whether creates of this object should be handed to a background task.
    fn run_in_background(&self) -> bool {
        false
    }

    /// Payload sent over the wire, without the type wrapper.
    fn serialize(&self) -> Value;

    /// Client-side checks run before the object is queued.
    fn validate(&self) -> ModelResult<()> {
        Ok(())
    }

    /// Ingests the server payload returned for a batched create.
    fn created(&self, payload: &Value) -> ModelResult<()>;

    /// Ingests the server payload returned for an individual update.
    fn updated(&self, payload: &Value) -> ModelResult<()> {
        self.created(payload)
    }

    /// Completes linkage records that were waiting for this object's id.
    async fn resolve_deferred_bindings(&self) -> ModelResult<()> {
        Ok(())
    }
}
