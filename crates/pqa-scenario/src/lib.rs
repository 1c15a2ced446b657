//! PQA Scenario - ground truth, plans under test, and their synthesizers
//!
//! The [`Scenario`] is the authoritative record grounding checks verify
//! against; the [`Plan`] is the artifact under test, synthesized at a
//! declared quality tier with deliberate defect injection for the lower
//! tiers.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod plan;
pub mod scenario;
pub mod synthesizer;

pub use plan::{DeliberateIssue, IssueKind, Plan, QualityTier};
pub use scenario::Scenario;
pub use synthesizer::{PlanSynthesizer, ScenarioSynthesizer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
