//! Network seam used by the queue.

use async_trait::async_trait;
use ggrc_client::{BackgroundTask, BatchResponse, ClientResult, GgrcApiClient, SaveOptions};
use serde_json::Value;

/// The three requests the queue issues.
#[async_trait]
pub trait SaveTransport: Send + Sync {
    /// Creates the wrapped objects in `body` with one collection post.
    async fn post_batch(
        &self,
        plural: &str,
        body: Vec<Value>,
        background: bool,
    ) -> ClientResult<BatchResponse>;

    /// Saves one already persisted object.
    async fn update(
        &self,
        plural: &str,
        id: i64,
        body: Value,
        options: &SaveOptions,
    ) -> ClientResult<Value>;

    async fn find_background_task(&self, id: i64) -> ClientResult<BackgroundTask>;
}

#[async_trait]
impl SaveTransport for GgrcApiClient {
    async fn post_batch(
        &self,
        plural: &str,
        body: Vec<Value>,
        background: bool,
    ) -> ClientResult<BatchResponse> {
        self.post_collection(plural, &body, background).await
    }

    async fn update(
        &self,
        plural: &str,
        id: i64,
        body: Value,
        options: &SaveOptions,
    ) -> ClientResult<Value> {
        GgrcApiClient::update(self, plural, id, &body, options).await
    }

    async fn find_background_task(&self, id: i64) -> ClientResult<BackgroundTask> {
        self.get_background_task(id).await
    }
}
