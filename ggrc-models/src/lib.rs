//! Domain model seam for the GGRC save queue.
//!
//! The queue only needs a handful of operations from a model object; they
//! are collected in [`Cacheable`]. [`Threat`] is the concrete risk-category
//! model used by the application.

pub mod cacheable;
pub mod error;
pub mod threat;

pub use cacheable::{Cacheable, Stub};
pub use error::{ModelError, ModelResult};
pub use threat::{Relationship, Threat, ThreatAttrs};
