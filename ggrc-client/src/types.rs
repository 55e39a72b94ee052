//! Wire types for the GGRC API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of a collection-post response.
///
/// The server answers a collection post with a list of `[status, payload]`
/// pairs, positionally aligned with the request body. Anything that does not
/// have that shape decodes as `Malformed` so the caller can reject just the
/// one object it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Status(u16, Value),
    Malformed(Value),
}

/// Reference to a server-side background task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: i64,
}

/// Decoded body of a collection post.
///
/// `Entries` is tried first: a JSON array always lands there, so only an
/// object carrying `background_task` can become `Background`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResponse {
    Entries(Vec<BatchEntry>),
    Background { background_task: TaskRef },
}

/// A server-side deferred job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTask {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Conditional-request headers for updates of persisted objects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Sent as `If-Match`; the object's last known etag.
    #[serde(default)]
    pub if_match: Option<String>,
    /// Sent as `If-Unmodified-Since`; the object's last known modification time.
    #[serde(default)]
    pub if_unmodified_since: Option<String>,
}
