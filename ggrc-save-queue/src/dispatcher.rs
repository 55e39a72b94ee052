//! Per-bucket dispatcher.
//!
//! A dispatcher is a chain of dispatch units for one bucket. Each pass posts
//! one batch; if more objects arrived meanwhile the pass submits the next
//! unit for the same bucket, otherwise it ends the drain cycle and
//! redistributes everything collected during it.

use crate::bucket::{BucketKey, ResponsePair};
use crate::error::SaveError;
use crate::pending::{PendingSave, SaveOutcome};
use crate::queue::QueueInner;
use crate::redistribute::redistribute;
use crate::runner::DispatchUnit;
use ggrc_client::{BatchResponse, TaskRef};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

pub(crate) fn bucket_unit(inner: Arc<QueueInner>, key: BucketKey) -> DispatchUnit {
    Box::pin(dispatch_pass(inner, key))
}

async fn dispatch_pass(inner: Arc<QueueInner>, key: BucketKey) {
    let mut claim = BucketClaim {
        inner: &inner,
        key: &key,
        handed_on: false,
    };

    let taken = {
        let mut buckets = inner.lock_buckets();
        buckets
            .get_mut(&key)
            .map(|bucket| (bucket.take_batch(inner.config.batch_size), bucket.plural().to_string()))
    };
    let Some((objects, plural)) = taken else {
        error!("dispatcher started for unknown bucket {key}");
        return;
    };

    let collected = if objects.is_empty() {
        None
    } else {
        post(&inner, &key, &plural, objects).await
    };

    let drained = {
        let mut buckets = inner.lock_buckets();
        let Some(bucket) = buckets.get_mut(&key) else {
            return;
        };
        if let Some(pair) = collected {
            bucket.record_response(pair);
        }
        if bucket.has_pending() {
            None
        } else {
            Some(bucket.finish())
        }
    };
    claim.handed_on = true;
    drop(claim);

    match drained {
        None => {
            debug!("bucket {key} received more objects, scheduling next pass");
            inner.batcher.submit(bucket_unit(Arc::clone(&inner), key));
        }
        Some(pairs) => {
            debug!("bucket {key} drained, redistributing {} responses", pairs.len());
            redistribute(&key.resource, pairs).await;
        }
    }
}

/// Keeps a bucket from staying claimed when its pass unwinds.
///
/// Armed for the whole pass; the pass disarms it once the bucket is either
/// finished or handed to the next unit. If the pass panics first, the drop
/// does that hand-off instead: a bucket with pending objects gets a fresh
/// unit, an empty one is finished and its collected responses are
/// redistributed. Objects of the batch that was in flight are dropped and
/// their receipts resolve as abandoned.
struct BucketClaim<'a> {
    inner: &'a Arc<QueueInner>,
    key: &'a BucketKey,
    handed_on: bool,
}

impl Drop for BucketClaim<'_> {
    fn drop(&mut self) {
        if self.handed_on {
            return;
        }
        let drained = {
            let mut buckets = self.inner.lock_buckets();
            let Some(bucket) = buckets.get_mut(self.key) else {
                return;
            };
            error!("dispatch pass for bucket {} unwound, releasing it", self.key);
            if bucket.has_pending() {
                None
            } else {
                Some(bucket.finish())
            }
        };

        match drained {
            None => self
                .inner
                .batcher
                .submit(bucket_unit(Arc::clone(self.inner), self.key.clone())),
            Some(pairs) if pairs.is_empty() => {}
            Some(pairs) => match Handle::try_current() {
                Ok(handle) => {
                    let resource = self.key.resource.clone();
                    handle.spawn(async move { redistribute(&resource, pairs).await });
                }
                Err(_) => warn!(
                    "bucket {}: no runtime left, dropping {} responses",
                    self.key,
                    pairs.len()
                ),
            },
        }
    }
}

/// Posts one batch. Returns the pair to keep for redistribution, or `None`
/// when the objects were already settled here.
async fn post(
    inner: &QueueInner,
    key: &BucketKey,
    plural: &str,
    objects: Vec<PendingSave>,
) -> Option<ResponsePair> {
    let body = objects.iter().map(PendingSave::wire_payload).collect();
    debug!("bucket {key}: posting {} objects to /api/{plural}", objects.len());

    match inner.transport.post_batch(plural, body, key.background).await {
        Err(err) => {
            warn!("bucket {key}: batch of {} failed: {err}", objects.len());
            for pending in objects {
                pending.reject(SaveError::from_client(&err));
            }
            None
        }
        Ok(BatchResponse::Background { background_task }) => {
            resolve_with_task(inner, key, background_task, objects).await;
            None
        }
        Ok(BatchResponse::Entries(entries)) => Some(ResponsePair { objects, entries }),
    }
}

/// Resolves every object of the batch with the one task the server created.
async fn resolve_with_task(
    inner: &QueueInner,
    key: &BucketKey,
    task: TaskRef,
    objects: Vec<PendingSave>,
) {
    match inner.transport.find_background_task(task.id).await {
        Ok(task) => {
            debug!("bucket {key}: {} objects deferred to background task {}", objects.len(), task.id);
            for pending in objects {
                pending.resolve(SaveOutcome::Background(task.clone()));
            }
        }
        Err(err) => {
            warn!("bucket {key}: lookup of background task {} failed: {err}", task.id);
            for pending in objects {
                pending.reject(SaveError::from_client(&err));
            }
        }
    }
}
