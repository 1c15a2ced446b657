//! PQA Evaluator - plan evaluation and score aggregation
//!
//! Runs every assertion against (scenario, plan) with the discipline split
//! enforced here, not in the oracle: structural checks are presence-only,
//! grounding checks are accuracy-only, and any reply that conflates the two
//! is rejected as a failure. Results aggregate into a weighted score and an
//! overall verdict.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod evaluator;
pub mod result;
pub mod score;

pub use evaluator::PlanEvaluator;
pub use result::{EvaluationResult, EvidenceSpan};
pub use score::{aggregate, ScoreConfig, ScoreReport, Verdict};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
