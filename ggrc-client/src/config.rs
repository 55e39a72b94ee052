//! API client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the GGRC API client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the GGRC server (e.g., "https://ggrc.example.com").
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Header marking a collection post as a background-task request.
    pub background_task_header: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
            background_task_header: "X-GGRC-BackgroundTask".to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a config pointing at the given server, other fields default.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }
}
