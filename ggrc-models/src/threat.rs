//! Threat model (risk category).

use crate::cacheable::{Cacheable, Stub};
use crate::error::{ModelError, ModelResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub const ROOT_OBJECT: &str = "threat";
pub const ROOT_COLLECTION: &str = "threats";
pub const CATEGORY: &str = "risk";
pub const DEFAULT_STATUS: &str = "Draft";

pub const STATUSES: &[&str] = &[
    "Draft",
    "Final",
    "Effective",
    "Ineffective",
    "Launched",
    "Not Launched",
    "In Scope",
    "Not in Scope",
    "Deprecated",
];

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Serializable attributes of a threat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Stub>,
}

impl Default for ThreatAttrs {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            status: default_status(),
            slug: None,
            description: None,
            url: None,
            reference_url: None,
            context: None,
        }
    }
}

/// Fields the server may send back; absent ones leave local state alone.
#[derive(Deserialize)]
struct ThreatPatch {
    id: Option<i64>,
    title: Option<String>,
    status: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    url: Option<String>,
    reference_url: Option<String>,
    context: Option<Stub>,
}

/// A relationship from a threat to another object.
///
/// Relationships added before the threat is saved have no source yet; they
/// are bound once the server assigns the threat an id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: Option<Stub>,
    pub destination: Stub,
}

#[derive(Default)]
struct Bindings {
    pending: Vec<Relationship>,
    bound: Vec<Relationship>,
}

/// A threat, shared between the caller and the save queue.
pub struct Threat {
    attrs: Mutex<ThreatAttrs>,
    bindings: Mutex<Bindings>,
    run_in_background: bool,
}

impl Threat {
    pub fn new(title: impl Into<String>) -> Self {
        Self::from_attrs(ThreatAttrs {
            title: title.into(),
            ..ThreatAttrs::default()
        })
    }

    pub fn from_attrs(attrs: ThreatAttrs) -> Self {
        Self {
            attrs: Mutex::new(attrs),
            bindings: Mutex::new(Bindings::default()),
            run_in_background: false,
        }
    }

    /// Marks creates of this threat as background-task work.
    pub fn in_background(mut self) -> Self {
        self.run_in_background = true;
        self
    }

    /// Returns a snapshot of the current attributes.
    pub fn attrs(&self) -> ThreatAttrs {
        self.lock_attrs().clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.lock_attrs().status = status.into();
    }

    /// Queues a relationship to `destination`, bound now if the threat has an id.
    pub fn relate_to(&self, destination: Stub) {
        let id = self.id();
        let mut bindings = self.lock_bindings();
        match id {
            Some(id) => bindings.bound.push(Relationship {
                source: Some(Stub::new("Threat", id)),
                destination,
            }),
            None => bindings.pending.push(Relationship {
                source: None,
                destination,
            }),
        }
    }

    pub fn pending_bindings(&self) -> usize {
        self.lock_bindings().pending.len()
    }

    pub fn relationships(&self) -> Vec<Relationship> {
        self.lock_bindings().bound.clone()
    }

    fn lock_attrs(&self) -> MutexGuard<'_, ThreatAttrs> {
        self.attrs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_bindings(&self) -> MutexGuard<'_, Bindings> {
        self.bindings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, payload: &Value, require_id: bool) -> ModelResult<()> {
        let patch: ThreatPatch = serde_json::from_value(payload.clone())?;
        if require_id && patch.id.is_none() {
            return Err(ModelError::MissingField("id"));
        }

        let mut attrs = self.lock_attrs();
        if let Some(id) = patch.id {
            attrs.id = Some(id);
        }
        if let Some(title) = patch.title {
            attrs.title = title;
        }
        if let Some(status) = patch.status {
            attrs.status = status;
        }
        if patch.slug.is_some() {
            attrs.slug = patch.slug;
        }
        if patch.description.is_some() {
            attrs.description = patch.description;
        }
        if patch.url.is_some() {
            attrs.url = patch.url;
        }
        if patch.reference_url.is_some() {
            attrs.reference_url = patch.reference_url;
        }
        if patch.context.is_some() {
            attrs.context = patch.context;
        }
        Ok(())
    }
}

#[async_trait]
impl Cacheable for Threat {
    fn table_singular(&self) -> &str {
        ROOT_OBJECT
    }

    fn table_plural(&self) -> &str {
        ROOT_COLLECTION
    }

    fn id(&self) -> Option<i64> {
        self.lock_attrs().id
    }

    fn run_in_background(&self) -> bool {
        self.run_in_background
    }

    fn serialize(&self) -> Value {
        serde_json::to_value(&*self.lock_attrs()).unwrap_or(Value::Null)
    }

    fn validate(&self) -> ModelResult<()> {
        let attrs = self.lock_attrs();
        if attrs.title.trim().is_empty() {
            return Err(ModelError::Validation {
                field: "title",
                message: "cannot be blank".to_string(),
            });
        }
        if !STATUSES.contains(&attrs.status.as_str()) {
            return Err(ModelError::Validation {
                field: "status",
                message: format!("'{}' is not a valid status", attrs.status),
            });
        }
        Ok(())
    }

    fn created(&self, payload: &Value) -> ModelResult<()> {
        self.apply(payload, true)
    }

    fn updated(&self, payload: &Value) -> ModelResult<()> {
        self.apply(payload, false)
    }

    async fn resolve_deferred_bindings(&self) -> ModelResult<()> {
        let id = self.id().ok_or(ModelError::Unsaved)?;
        let mut bindings = self.lock_bindings();
        let pending = std::mem::take(&mut bindings.pending);
        if !pending.is_empty() {
            debug!("binding {} relationships to threat {id}", pending.len());
        }
        for mut rel in pending {
            rel.source = Some(Stub::new("Threat", id));
            bindings.bound.push(rel);
        }
        Ok(())
    }
}
