//! Pending saves and their completion handles.
//!
//! A [`PendingSave`] owns the sending half of a one-shot channel and the
//! caller keeps the [`SaveReceipt`]. Settling consumes the pending save, so
//! an object can be resolved or rejected at most once; dropping it unsettled
//! resolves the receipt with [`SaveError::Abandoned`].

use crate::error::{SaveError, SaveResult};
use ggrc_client::{BackgroundTask, SaveOptions};
use ggrc_models::Cacheable;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// What a successful save resolves with.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    /// The server stored the object; carries the payload it returned.
    Saved(Value),
    /// The server deferred the work to a background task.
    Background(BackgroundTask),
}

impl SaveOutcome {
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Saved(payload) => Some(payload),
            Self::Background(_) => None,
        }
    }

    pub fn background_task(&self) -> Option<&BackgroundTask> {
        match self {
            Self::Background(task) => Some(task),
            Self::Saved(_) => None,
        }
    }
}

/// An object waiting to be saved, together with its completion handle.
pub struct PendingSave {
    id: Uuid,
    object: Arc<dyn Cacheable>,
    options: SaveOptions,
    completion: oneshot::Sender<SaveResult<SaveOutcome>>,
}

impl PendingSave {
    pub fn new(object: Arc<dyn Cacheable>, options: SaveOptions) -> (Self, SaveReceipt) {
        let id = Uuid::now_v7();
        let (completion, rx) = oneshot::channel();
        let pending = Self {
            id,
            object,
            options,
            completion,
        };
        (pending, SaveReceipt { id, rx })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn object(&self) -> &Arc<dyn Cacheable> {
        &self.object
    }

    pub fn options(&self) -> &SaveOptions {
        &self.options
    }

    /// The object's payload wrapped in its single-key type envelope.
    pub fn wire_payload(&self) -> Value {
        let mut wrapper = serde_json::Map::with_capacity(1);
        wrapper.insert(
            self.object.table_singular().to_string(),
            self.object.serialize(),
        );
        Value::Object(wrapper)
    }

    pub fn resolve(self, outcome: SaveOutcome) {
        self.settle(Ok(outcome));
    }

    pub fn reject(self, err: SaveError) {
        self.settle(Err(err));
    }

    fn settle(self, result: SaveResult<SaveOutcome>) {
        if self.completion.send(result).is_err() {
            debug!("receipt for save {} was dropped before settlement", self.id);
        }
    }
}

impl fmt::Debug for PendingSave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSave")
            .field("id", &self.id)
            .field("type", &self.object.table_singular())
            .field("object_id", &self.object.id())
            .finish()
    }
}

/// The caller's side of a queued save; resolves once the save settles.
#[derive(Debug)]
pub struct SaveReceipt {
    id: Uuid,
    rx: oneshot::Receiver<SaveResult<SaveOutcome>>,
}

impl SaveReceipt {
    /// Correlation id of the save, as it appears in queue logs.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Future for SaveReceipt {
    type Output = SaveResult<SaveOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(SaveError::Abandoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ggrc_models::Threat;
    use tokio_test::{assert_pending, assert_ready};

    fn pending() -> (PendingSave, SaveReceipt) {
        PendingSave::new(Arc::new(Threat::new("Phishing")), SaveOptions::default())
    }

    #[test]
    fn wire_payload_is_wrapped_by_type() {
        let (pending, _receipt) = pending();
        let payload = pending.wire_payload();
        assert_eq!(payload["threat"]["title"], "Phishing");
        assert_eq!(payload.as_object().map(|m| m.len()), Some(1));
    }

    #[test]
    fn receipt_waits_until_resolved() {
        let (pending, receipt) = pending();
        let mut receipt = tokio_test::task::spawn(receipt);
        assert_pending!(receipt.poll());

        pending.resolve(SaveOutcome::Saved(serde_json::json!({ "id": 1 })));
        let outcome = assert_ready!(receipt.poll()).unwrap();
        assert_eq!(outcome.payload(), Some(&serde_json::json!({ "id": 1 })));
    }

    #[test]
    fn receipt_sees_rejection() {
        let (pending, receipt) = pending();
        let mut receipt = tokio_test::task::spawn(receipt);
        pending.reject(SaveError::Transport("reset".into()));
        let err = assert_ready!(receipt.poll()).unwrap_err();
        assert!(matches!(err, SaveError::Transport(_)));
    }

    #[test]
    fn dropped_pending_save_is_abandoned() {
        let (pending, receipt) = pending();
        let mut receipt = tokio_test::task::spawn(receipt);
        drop(pending);
        let err = assert_ready!(receipt.poll()).unwrap_err();
        assert!(matches!(err, SaveError::Abandoned));
    }

    #[test]
    fn settling_after_receipt_dropped_is_harmless() {
        let (pending, receipt) = pending();
        drop(receipt);
        pending.reject(SaveError::Abandoned);
    }

    #[test]
    fn receipt_id_matches_pending_id() {
        let (pending, receipt) = pending();
        assert_eq!(pending.id(), receipt.id());
    }
}
