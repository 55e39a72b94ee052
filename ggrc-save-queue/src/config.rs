//! Save queue configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the save queue.
///
/// Deserializes from a partial application config: missing fields keep their
/// defaults, and the upper-case names used by the web client's global config
/// (`DELAY`, `MAX_INSTANCES`, `BATCH_SIZE`) are accepted as aliases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Quiet period before a macro-batch is flushed, in milliseconds.
    #[serde(alias = "DELAY")]
    pub debounce_delay_ms: u64,

    /// Maximum number of dispatch units running at once within one flush.
    #[serde(alias = "MAX_INSTANCES")]
    pub max_instances: usize,

    /// Maximum number of objects in one collection post (foreground buckets).
    #[serde(alias = "BATCH_SIZE")]
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: 100,
            max_instances: 3,
            batch_size: 1000,
        }
    }
}

impl QueueConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Clamps limits that would stall the queue to their smallest usable value.
    pub fn normalized(mut self) -> Self {
        self.max_instances = self.max_instances.max(1);
        self.batch_size = self.batch_size.max(1);
        self
    }
}
