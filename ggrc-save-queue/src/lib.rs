//! Write-coalescing save queue for the GGRC API.
//!
//! Saves are grouped and throttled before they reach the server:
//! - New objects are collected per resource type (a *bucket*) and created
//!   with one collection post per pass
//! - Every unit of work goes through a debounce window, so bursts of saves
//!   are flushed together as one macro-batch
//! - Each flush runs at most `max_instances` requests at a time
//! - Batched responses are redistributed to the objects that produced them;
//!   every caller observes its own result through a [`SaveReceipt`]
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use ggrc_client::{ClientConfig, GgrcApiClient, SaveOptions};
//! use ggrc_models::Threat;
//! use ggrc_save_queue::{QueueConfig, SaveQueue};
//!
//! let client = GgrcApiClient::new(ClientConfig::with_base_url("https://ggrc.example.com"))?;
//! let queue = SaveQueue::new(QueueConfig::default(), Arc::new(client));
//! let receipt = queue.enqueue(Arc::new(Threat::new("Phishing")), SaveOptions::default());
//! let outcome = receipt.await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod bucket;
pub mod config;
pub mod debounce;
mod dispatcher;
pub mod error;
pub mod pending;
pub mod queue;
mod redistribute;
pub mod runner;
pub mod transport;

pub use bucket::{BucketKey, BucketStatus};
pub use config::QueueConfig;
pub use error::{SaveError, SaveResult};
pub use pending::{SaveOutcome, SaveReceipt};
pub use queue::SaveQueue;
pub use transport::SaveTransport;
