//! Pipeline error types

use crate::stage::Stage;
use std::path::PathBuf;

/// Errors raised by run persistence, the coordinator, and the batch driver
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage was requested before its prerequisite produced output
    #[error("stage '{stage}' requires output of '{missing}' which is not present")]
    MissingPrerequisite {
        /// Stage that was requested
        stage: Stage,
        /// Prerequisite whose output file is absent
        missing: Stage,
    },

    /// A persisted artifact failed re-validation on read
    #[error("artifact for stage '{stage}' is invalid: {reason}")]
    InvalidArtifact {
        /// Stage whose output was read
        stage: Stage,
        /// What the validation rejected
        reason: String,
    },

    /// Unknown run or batch identifier
    #[error("no run state found at {0}")]
    UnknownRun(PathBuf),

    /// A batch stopped on a fatal error with its state persisted
    ///
    /// Carries the batch id so callers can read back the partial state and
    /// report counts for the items that did complete.
    #[error("batch {batch_id} aborted: {source}")]
    BatchAborted {
        /// Batch whose state file holds the partial accounting
        batch_id: crate::batch::BatchId,
        /// The fatal error that stopped processing
        #[source]
        source: Box<PipelineError>,
    },

    /// Oracle failure surfaced by a stage
    #[error(transparent)]
    Oracle(#[from] pqa_oracle::OracleError),

    /// Filesystem failure
    #[error("io failure at {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure
    #[error("serialization failure at {path}: {source}")]
    Serde {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// True when the whole run (or batch) must stop rather than continue
    /// with the next item
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Oracle(err) => err.is_fatal(),
            Self::Io { .. } | Self::Serde { .. } | Self::UnknownRun(_) => true,
            Self::BatchAborted { .. } => true,
            Self::MissingPrerequisite { .. } | Self::InvalidArtifact { .. } => false,
        }
    }
}
