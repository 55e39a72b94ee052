//! Shared helpers for save queue integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use ggrc_client::{
    BackgroundTask, BatchEntry, BatchResponse, ClientError, ClientResult, SaveOptions,
};
use ggrc_models::{Cacheable, ModelError, ModelResult, Threat, ThreatAttrs};
use ggrc_save_queue::SaveTransport;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// One request seen by the fake transport.
#[derive(Clone, Debug, PartialEq)]
pub enum CallKind {
    Batch {
        plural: String,
        size: usize,
        background: bool,
    },
    Update {
        plural: String,
        id: i64,
    },
    TaskLookup {
        id: i64,
    },
}

#[derive(Clone, Debug)]
pub struct Call {
    pub kind: CallKind,
    pub started: Instant,
    pub finished: Option<Instant>,
}

/// In-memory transport with scripted replies, latency and concurrency
/// tracking. Unscripted collection posts succeed and assign increasing ids.
pub struct FakeTransport {
    latency: Duration,
    next_id: AtomicI64,
    calls: Mutex<Vec<Call>>,
    batch_replies: Mutex<HashMap<String, VecDeque<ClientResult<BatchResponse>>>>,
    update_failures: Mutex<HashMap<i64, ClientError>>,
    tasks: Mutex<HashMap<i64, BackgroundTask>>,
    panic_posts: Mutex<HashSet<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    active_by_plural: Mutex<HashMap<String, usize>>,
    max_by_plural: Mutex<HashMap<String, usize>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::with_latency(Duration::from_millis(10))
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            next_id: AtomicI64::new(1),
            calls: Mutex::new(Vec::new()),
            batch_replies: Mutex::new(HashMap::new()),
            update_failures: Mutex::new(HashMap::new()),
            tasks: Mutex::new(HashMap::new()),
            panic_posts: Mutex::new(HashSet::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            active_by_plural: Mutex::new(HashMap::new()),
            max_by_plural: Mutex::new(HashMap::new()),
        }
    }

    /// Queues the reply for the next collection post to `plural`.
    pub fn reply_batch(&self, plural: &str, reply: ClientResult<BatchResponse>) {
        self.batch_replies
            .lock()
            .unwrap()
            .entry(plural.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn reply_entries(&self, plural: &str, entries: Value) {
        let response = serde_json::from_value(entries).unwrap();
        self.reply_batch(plural, Ok(response));
    }

    /// Makes the next collection post to `plural` panic, as a buggy
    /// transport would. The panicking post is not recorded as a call.
    pub fn panic_next_post(&self, plural: &str) {
        self.panic_posts.lock().unwrap().insert(plural.to_string());
    }

    pub fn fail_update(&self, id: i64, err: ClientError) {
        self.update_failures.lock().unwrap().insert(id, err);
    }

    pub fn add_task(&self, task: BackgroundTask) {
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn batch_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c.kind, CallKind::Batch { .. }))
            .collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_calls()
            .iter()
            .map(|c| match &c.kind {
                CallKind::Batch { size, .. } => *size,
                _ => unreachable!(),
            })
            .collect()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn max_active_for(&self, plural: &str) -> usize {
        self.max_by_plural
            .lock()
            .unwrap()
            .get(plural)
            .copied()
            .unwrap_or(0)
    }

    fn begin(&self, kind: CallKind, plural: Option<&str>) -> usize {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        if let Some(plural) = plural {
            let mut active = self.active_by_plural.lock().unwrap();
            let count = active.entry(plural.to_string()).or_default();
            *count += 1;
            let mut max = self.max_by_plural.lock().unwrap();
            let seen = max.entry(plural.to_string()).or_default();
            *seen = (*seen).max(*count);
        }
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call {
            kind,
            started: Instant::now(),
            finished: None,
        });
        calls.len() - 1
    }

    fn end(&self, index: usize, plural: Option<&str>) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        if let Some(plural) = plural {
            if let Some(count) = self.active_by_plural.lock().unwrap().get_mut(plural) {
                *count -= 1;
            }
        }
        self.calls.lock().unwrap()[index].finished = Some(Instant::now());
    }

    fn auto_entries(&self, body: &[Value]) -> BatchResponse {
        let entries = body
            .iter()
            .map(|item| {
                let (ty, payload) = item
                    .as_object()
                    .and_then(|m| m.iter().next())
                    .expect("wrapped payload");
                let mut payload = payload.clone();
                payload["id"] = json!(self.next_id.fetch_add(1, Ordering::SeqCst));
                let mut wrapper = serde_json::Map::new();
                wrapper.insert(ty.clone(), payload);
                BatchEntry::Status(201, Value::Object(wrapper))
            })
            .collect();
        BatchResponse::Entries(entries)
    }
}

#[async_trait]
impl SaveTransport for FakeTransport {
    async fn post_batch(
        &self,
        plural: &str,
        body: Vec<Value>,
        background: bool,
    ) -> ClientResult<BatchResponse> {
        if self.panic_posts.lock().unwrap().remove(plural) {
            sleep(self.latency).await;
            panic!("transport bug while posting {plural}");
        }
        let kind = CallKind::Batch {
            plural: plural.to_string(),
            size: body.len(),
            background,
        };
        let index = self.begin(kind, Some(plural));
        sleep(self.latency).await;
        let scripted = self
            .batch_replies
            .lock()
            .unwrap()
            .get_mut(plural)
            .and_then(VecDeque::pop_front);
        let reply = scripted.unwrap_or_else(|| Ok(self.auto_entries(&body)));
        self.end(index, Some(plural));
        reply
    }

    async fn update(
        &self,
        plural: &str,
        id: i64,
        body: Value,
        _options: &SaveOptions,
    ) -> ClientResult<Value> {
        let kind = CallKind::Update {
            plural: plural.to_string(),
            id,
        };
        let index = self.begin(kind, Some(plural));
        sleep(self.latency).await;
        let failure = self.update_failures.lock().unwrap().remove(&id);
        self.end(index, Some(plural));
        match failure {
            Some(err) => Err(err),
            None => Ok(body),
        }
    }

    async fn find_background_task(&self, id: i64) -> ClientResult<BackgroundTask> {
        let index = self.begin(CallKind::TaskLookup { id }, None);
        sleep(self.latency).await;
        let task = self.tasks.lock().unwrap().get(&id).cloned();
        self.end(index, None);
        task.ok_or_else(|| ClientError::NotFound(format!("background task {id}")))
    }
}

/// A second resource type, so tests can run more than one bucket.
pub struct Control {
    title: String,
    id: Mutex<Option<i64>>,
}

impl Control {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            id: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Cacheable for Control {
    fn table_singular(&self) -> &str {
        "control"
    }

    fn table_plural(&self) -> &str {
        "controls"
    }

    fn id(&self) -> Option<i64> {
        *self.id.lock().unwrap()
    }

    fn serialize(&self) -> Value {
        json!({ "title": self.title })
    }

    fn created(&self, payload: &Value) -> ModelResult<()> {
        let id = payload["id"].as_i64().ok_or(ModelError::MissingField("id"))?;
        *self.id.lock().unwrap() = Some(id);
        Ok(())
    }
}

pub fn threat(title: &str) -> Arc<Threat> {
    Arc::new(Threat::new(title))
}

pub fn background_threat(title: &str) -> Arc<Threat> {
    Arc::new(Threat::new(title).in_background())
}

pub fn saved_threat(id: i64) -> Arc<Threat> {
    Arc::new(Threat::from_attrs(ThreatAttrs {
        id: Some(id),
        title: format!("threat {id}"),
        ..ThreatAttrs::default()
    }))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
