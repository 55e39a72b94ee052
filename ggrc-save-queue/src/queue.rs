//! The save queue: routes saves into buckets or individual units and feeds
//! them through the debounce.

use crate::bucket::{Bucket, BucketKey, BucketStatus};
use crate::config::QueueConfig;
use crate::debounce::MacroBatcher;
use crate::dispatcher;
use crate::error::SaveError;
use crate::pending::{PendingSave, SaveOutcome, SaveReceipt};
use crate::runner::DispatchUnit;
use crate::transport::SaveTransport;
use ggrc_client::SaveOptions;
use ggrc_models::{Cacheable, ModelError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// State shared by every queue handle and every dispatch unit.
pub(crate) struct QueueInner {
    pub(crate) config: QueueConfig,
    pub(crate) transport: Arc<dyn SaveTransport>,
    pub(crate) batcher: MacroBatcher,
    buckets: Mutex<HashMap<BucketKey, Bucket>>,
}

impl QueueInner {
    /// Bucket state is only touched in short synchronous sections, never
    /// across an await, so a poisoned lock still holds consistent data.
    pub(crate) fn lock_buckets(&self) -> MutexGuard<'_, HashMap<BucketKey, Bucket>> {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Write-coalescing queue for model saves.
///
/// Cloning is cheap; all clones feed the same buckets and debounce loop.
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct SaveQueue {
    inner: Arc<QueueInner>,
}

impl SaveQueue {
    pub fn new(config: QueueConfig, transport: Arc<dyn SaveTransport>) -> Self {
        let config = config.normalized();
        info!(
            "save queue started (delay {}ms, {} concurrent, batch size {})",
            config.debounce_delay_ms, config.max_instances, config.batch_size
        );
        let batcher = MacroBatcher::spawn(config.debounce_delay(), config.max_instances);
        Self {
            inner: Arc::new(QueueInner {
                config,
                transport,
                batcher,
                buckets: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Queues `object` for saving and returns immediately.
    ///
    /// New objects join the bucket for their type and are created with a
    /// collection post; persisted objects are updated individually with
    /// `options`. The outcome is only ever reported through the receipt.
    pub fn enqueue(&self, object: Arc<dyn Cacheable>, options: SaveOptions) -> SaveReceipt {
        let (pending, receipt) = PendingSave::new(object, options);

        if let Err(err) = pending.object().validate() {
            warn!("save {} not queued: {err}", pending.id());
            pending.reject(SaveError::Invalid(err));
            return receipt;
        }

        if !pending.object().is_new() {
            debug!("save {} queued as individual update", pending.id());
            let unit = update_unit(Arc::clone(&self.inner.transport), pending);
            self.inner.batcher.submit(unit);
            return receipt;
        }

        let key = BucketKey::for_object(pending.object().as_ref());
        let plural = pending.object().table_plural().to_string();
        let start = {
            let mut buckets = self.inner.lock_buckets();
            let bucket = buckets
                .entry(key.clone())
                .or_insert_with(|| Bucket::new(key.clone(), plural));
            bucket.push(pending);
            bucket.try_start()
        };

        if start {
            debug!("starting dispatcher for bucket {key}");
            self.inner
                .batcher
                .submit(dispatcher::bucket_unit(Arc::clone(&self.inner), key));
        }
        receipt
    }

    /// Current state of the bucket for `key`, if it was ever used.
    pub fn bucket_status(&self, key: &BucketKey) -> Option<BucketStatus> {
        self.inner.lock_buckets().get(key).map(Bucket::status)
    }
}

/// An individual save of an already persisted object.
fn update_unit(transport: Arc<dyn SaveTransport>, pending: PendingSave) -> DispatchUnit {
    Box::pin(async move {
        let object = Arc::clone(pending.object());
        let Some(id) = object.id() else {
            pending.reject(SaveError::Model(ModelError::Unsaved));
            return;
        };
        let resource = object.table_singular().to_string();

        let result = transport
            .update(
                object.table_plural(),
                id,
                pending.wire_payload(),
                pending.options(),
            )
            .await;

        match result {
            Ok(body) => {
                let payload = body.get(&resource).unwrap_or(&body).clone();
                match object.updated(&payload) {
                    Ok(()) => pending.resolve(SaveOutcome::Saved(payload)),
                    Err(err) => pending.reject(err.into()),
                }
            }
            Err(err) => {
                warn!("update of {resource} {id} failed: {err}");
                pending.reject(SaveError::from_client(&err));
            }
        }
    })
}
