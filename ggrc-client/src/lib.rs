//! REST client for the GGRC API.
//!
//! Covers the small slice of the API the save queue talks to:
//! - Collection posts that create many objects in one request
//! - Individual updates of already persisted objects
//! - Background task lookups for deferred server-side work

pub mod api_client;
pub mod config;
pub mod error;
pub mod types;

pub use api_client::GgrcApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use types::*;
