//! Per-resource-type accumulators of new objects.

use crate::pending::PendingSave;
use ggrc_client::BatchEntry;
use ggrc_models::Cacheable;
use std::collections::VecDeque;
use std::fmt;

/// Identifies a bucket: resource type plus foreground/background variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub resource: String,
    pub background: bool,
}

impl BucketKey {
    pub fn new(resource: impl Into<String>, background: bool) -> Self {
        Self {
            resource: resource.into(),
            background,
        }
    }

    pub fn for_object(object: &dyn Cacheable) -> Self {
        Self::new(object.table_singular(), object.run_in_background())
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.background {
            write!(f, "{}_bg", self.resource)
        } else {
            f.write_str(&self.resource)
        }
    }
}

/// One collection-post response together with the objects that produced it.
/// Entry `i` belongs to object `i`.
#[derive(Debug)]
pub struct ResponsePair {
    pub objects: Vec<PendingSave>,
    pub entries: Vec<BatchEntry>,
}

/// Point-in-time view of a bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketStatus {
    pub pending: usize,
    pub in_flight: bool,
    pub unprocessed_responses: usize,
}

/// Objects of one type waiting for a collection post.
#[derive(Debug)]
pub struct Bucket {
    key: BucketKey,
    plural: String,
    pending: VecDeque<PendingSave>,
    in_flight: bool,
    responses: Vec<ResponsePair>,
}

impl Bucket {
    pub fn new(key: BucketKey, plural: impl Into<String>) -> Self {
        Self {
            key,
            plural: plural.into(),
            pending: VecDeque::new(),
            in_flight: false,
            responses: Vec::new(),
        }
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn push(&mut self, pending: PendingSave) {
        self.pending.push_back(pending);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Claims the bucket for a new dispatcher. Returns false if one is
    /// already running.
    pub fn try_start(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Removes the objects for the next request from the front of the queue.
    /// Background buckets are not capped.
    pub fn take_batch(&mut self, batch_size: usize) -> Vec<PendingSave> {
        let count = if self.key.background {
            self.pending.len()
        } else {
            batch_size.min(self.pending.len())
        };
        self.pending.drain(..count).collect()
    }

    pub fn record_response(&mut self, pair: ResponsePair) {
        self.responses.push(pair);
    }

    /// Ends the current drain cycle: releases the bucket and hands back the
    /// responses collected during it.
    pub fn finish(&mut self) -> Vec<ResponsePair> {
        self.in_flight = false;
        std::mem::take(&mut self.responses)
    }

    pub fn status(&self) -> BucketStatus {
        BucketStatus {
            pending: self.pending.len(),
            in_flight: self.in_flight,
            unprocessed_responses: self.responses.len(),
        }
    }
}
