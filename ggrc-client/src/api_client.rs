//! HTTP client for the GGRC REST API.
//!
//! Posts batched creates to collection endpoints, updates single objects and
//! looks up background tasks. Uses reqwest with JSON serialization.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::*;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the GGRC API.
#[derive(Clone)]
pub struct GgrcApiClient {
    client: Client,
    config: ClientConfig,
}

impl GgrcApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        if config.api_base_url.is_empty() {
            return Err(ClientError::Config("missing api_base_url".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    // ── Collections ──

    /// Creates many objects with one collection post.
    ///
    /// `body` is the list of single-key wrappers (`{"threat": {...}}`). When
    /// `background` is set the server may answer with a background task
    /// instead of per-object results.
    pub async fn post_collection(
        &self,
        plural: &str,
        body: &[Value],
        background: bool,
    ) -> ClientResult<BatchResponse> {
        let path = format!("/api/{plural}");
        let mut req = self.client.post(self.url(&path)).json(body);
        if background {
            req = req.header(self.config.background_task_header.as_str(), "true");
        }

        debug!("POST {path} with {} objects (background: {background})", body.len());
        let resp = check_status(req.send().await?).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ── Objects ──

    /// Updates one persisted object, returning the response body.
    pub async fn update(
        &self,
        plural: &str,
        id: i64,
        body: &Value,
        options: &SaveOptions,
    ) -> ClientResult<Value> {
        let path = format!("/api/{plural}/{id}");
        let mut req = self.client.put(self.url(&path)).json(body);
        if let Some(etag) = &options.if_match {
            req = req.header(reqwest::header::IF_MATCH, etag.as_str());
        }
        if let Some(since) = &options.if_unmodified_since {
            req = req.header(reqwest::header::IF_UNMODIFIED_SINCE, since.as_str());
        }

        debug!("PUT {path}");
        let resp = req.send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("{plural}/{id}")));
        }
        let resp = check_status(resp).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ── Background tasks ──

    pub async fn get_background_task(&self, id: i64) -> ClientResult<BackgroundTask> {
        let path = format!("/api/background_tasks/{id}");
        let resp = self.client.get(self.url(&path)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("background task {id}")));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Resp {
            Wrapped { background_task: BackgroundTask },
            Bare(BackgroundTask),
        }
        let bytes = resp.bytes().await?;
        match serde_json::from_slice(&bytes)? {
            Resp::Wrapped { background_task } => Ok(background_task),
            Resp::Bare(task) => Ok(task),
        }
    }
}

/// Turns a non-2xx response into `ClientError::Status`, keeping the body.
async fn check_status(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
