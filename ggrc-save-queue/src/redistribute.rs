//! Hands batched responses back to the objects that produced them.

use crate::bucket::ResponsePair;
use crate::error::SaveError;
use crate::pending::{PendingSave, SaveOutcome};
use ggrc_client::BatchEntry;
use ggrc_models::Cacheable;
use serde_json::Value;
use tracing::{debug, warn};

/// Settles every object of every pair by position. Entry `i` of a pair's
/// response belongs to object `i`; a missing entry counts as malformed.
pub(crate) async fn redistribute(resource: &str, pairs: Vec<ResponsePair>) {
    for ResponsePair { objects, entries } in pairs {
        if entries.len() > objects.len() {
            warn!(
                "{resource}: response has {} entries for {} objects, ignoring the rest",
                entries.len(),
                objects.len()
            );
        }
        let mut entries = entries.into_iter();
        for pending in objects {
            settle_entry(resource, pending, entries.next()).await;
        }
    }
}

async fn settle_entry(resource: &str, pending: PendingSave, entry: Option<BatchEntry>) {
    match entry {
        Some(BatchEntry::Status(status, payload)) if (200..300).contains(&status) => {
            // Entries are usually wrapped as `{"<type>": {...}}`.
            let body = payload.get(resource).unwrap_or(&payload).clone();
            let object = pending.object().clone();
            match store_created(object.as_ref(), &body).await {
                Ok(()) => {
                    debug!("{resource}: save {} created", pending.id());
                    pending.resolve(SaveOutcome::Saved(body));
                }
                Err(err) => {
                    warn!("{resource}: save {} failed after create: {err}", pending.id());
                    pending.reject(err);
                }
            }
        }
        Some(BatchEntry::Status(status, body)) => {
            warn!("{resource}: save {} rejected with {status}", pending.id());
            pending.reject(SaveError::Rejected { status, body });
        }
        Some(BatchEntry::Malformed(raw)) => {
            warn!("{resource}: malformed response entry for save {}", pending.id());
            pending.reject(SaveError::MalformedEntry(Some(raw)));
        }
        None => {
            warn!("{resource}: no response entry for save {}", pending.id());
            pending.reject(SaveError::MalformedEntry(None));
        }
    }
}

async fn store_created(object: &dyn Cacheable, body: &Value) -> Result<(), SaveError> {
    object.created(body)?;
    object.resolve_deferred_bindings().await?;
    Ok(())
}
