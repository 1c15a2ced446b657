//! PQA Taxonomy - dimension catalog and applicability map
//!
//! Static reference data for the evaluation pipeline:
//! - Structural and grounding dimension IDs, names, and weights
//! - The fixed dimension-to-level precedence table
//! - The Structural→Grounding applicability map with rationales
//!
//! The catalog has no behavior beyond lookup. It is loaded once at process
//! start and consumed by every other component.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod dimension;
pub mod error;

pub use catalog::{Catalog, DimensionInfo, GroundingCandidate};
pub use dimension::{
    AssertionLevel, DimensionId, GroundingDimension, Layer, StructuralDimension,
};
pub use error::CatalogError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
