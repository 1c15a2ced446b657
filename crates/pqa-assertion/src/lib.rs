//! PQA Assertion - atomic assertion records and the decomposer/classifier
//!
//! One free-form assertion string becomes one or more atomic
//! [`AssertionRecord`]s, each tagged with a catalog dimension and, for
//! structural records, linked to the narrowed subset of applicable grounding
//! checks. Records form a two-level forest enforced at construction time.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classifier;
pub mod error;
pub mod record;

pub use classifier::AssertionClassifier;
pub use error::AssertionError;
pub use record::{AssertionId, AssertionRecord, AssertionSet};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
