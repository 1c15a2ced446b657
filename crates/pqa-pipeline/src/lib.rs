//! PQA Pipeline - resumable five-stage evaluation runs
//!
//! Wires the taxonomy, classifier, synthesizers, and evaluator into a
//! checkpointed pipeline: every stage persists its output as JSON in a
//! per-run directory, a halted run resumes from its first missing
//! checkpoint, and the batch driver applies the same discipline across a
//! file of inputs with per-item failure isolation.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod batch;
pub mod coordinator;
pub mod error;
pub mod stage;
pub mod state;

pub use batch::{BatchDriver, BatchId, BatchItem, BatchState, BatchSummary, ItemStatus};
pub use coordinator::{PipelineConfig, RunCoordinator, TierEvaluation, TierReport};
pub use error::PipelineError;
pub use stage::{Stage, StageStatus};
pub use state::{RunId, RunMetadata, RunStatus, RunStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
