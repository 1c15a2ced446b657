//! Batch driver
//!
//! Runs the full pipeline once per input line. Batch state is persisted
//! after every item so an interrupted or partially failed batch can be
//! resumed: items already marked successful are never re-run, items that
//! failed (or never started) are retried with a fresh run directory.
//!
//! Failure policy follows the oracle error taxonomy: a fatal error
//! (authentication, exhausted rate-limit budget) aborts the batch; anything
//! else is recorded against the item and the batch continues.

use crate::coordinator::RunCoordinator;
use crate::error::PipelineError;
use crate::stage::Stage;
use crate::state::{read_json, write_json, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use ulid::Ulid;

/// Unique batch identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Ulid);

impl BatchId {
    /// Generate a new batch ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

/// Per-item processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Not yet attempted
    Pending,
    /// Full pipeline completed
    Success,
    /// Attempted and failed; eligible for retry on resume
    Failed,
}

/// One batch item and its latest outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Position in the input file, zero-based
    pub index: usize,
    /// Seed input line
    pub input: String,
    /// Latest status
    pub status: ItemStatus,
    /// Run produced by the latest attempt, if any
    pub run_id: Option<RunId>,
    /// Error message of the latest failed attempt
    pub error: Option<String>,
    /// Wall time of the latest attempt
    pub duration_ms: u64,
}

/// Batch state persisted as `batch.json`, rewritten after every item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchState {
    /// Batch identifier, doubles as the directory suffix
    pub batch_id: BatchId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// All items, input order
    pub items: Vec<BatchItem>,
}

impl BatchState {
    /// Accounting over the current item statuses
    ///
    /// Pending items count as failures: a batch stopped mid-way must never
    /// report more successes than it has.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let successes = self
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Success)
            .count();
        BatchSummary {
            batch_id: self.batch_id,
            total: self.items.len(),
            successes,
            failures: self.items.len() - successes,
            items: self.items.clone(),
        }
    }
}

/// Index entry mapping an item back to its input line
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    index: usize,
    input: String,
}

/// Final batch accounting, persisted as `summary.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Batch identifier
    pub batch_id: BatchId,
    /// Items in the batch
    pub total: usize,
    /// Items with a completed pipeline
    pub successes: usize,
    /// Items whose latest attempt failed
    pub failures: usize,
    /// Per-item outcomes with timing
    pub items: Vec<BatchItem>,
}

impl BatchSummary {
    /// Tri-state process exit code: 0 all succeeded, 1 partial, 2 none
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.failures == 0 {
            0
        } else if self.successes > 0 {
            1
        } else {
            2
        }
    }
}

/// Drives a batch of pipeline runs over one coordinator
#[derive(Debug)]
pub struct BatchDriver {
    coordinator: RunCoordinator,
}

impl BatchDriver {
    /// Create a driver over a coordinator
    #[inline]
    #[must_use]
    pub fn new(coordinator: RunCoordinator) -> Self {
        Self { coordinator }
    }

    /// Directory holding a batch's state files
    #[must_use]
    pub fn batch_dir(&self, batch_id: BatchId) -> PathBuf {
        self.coordinator
            .store()
            .root()
            .join(format!("batch-{batch_id}"))
    }

    /// Run the full pipeline for every input
    ///
    /// # Errors
    /// A fatal error aborts the batch as [`PipelineError::BatchAborted`]
    /// with state persisted; per-item failures are recorded in the returned
    /// summary instead.
    pub async fn run(&self, inputs: Vec<String>) -> Result<BatchSummary, PipelineError> {
        let state = BatchState {
            batch_id: BatchId::new(),
            created_at: Utc::now(),
            items: inputs
                .into_iter()
                .enumerate()
                .map(|(index, input)| BatchItem {
                    index,
                    input,
                    status: ItemStatus::Pending,
                    run_id: None,
                    error: None,
                    duration_ms: 0,
                })
                .collect(),
        };

        let dir = self.batch_dir(state.batch_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| PipelineError::Io { path: dir.clone(), source })?;

        let index: Vec<IndexEntry> = state
            .items
            .iter()
            .map(|item| IndexEntry {
                index: item.index,
                input: item.input.clone(),
            })
            .collect();
        write_json(&dir.join("index.json"), &index).await?;
        write_json(&dir.join("batch.json"), &state).await?;

        tracing::info!(batch_id = %state.batch_id, items = state.items.len(), "batch started");
        self.process(state).await
    }

    /// Resume a batch: retry every item that is not yet successful
    ///
    /// Successful items are untouched, including their run directories.
    ///
    /// # Errors
    /// `UnknownRun` for an unknown batch ID; otherwise as [`Self::run`].
    pub async fn resume(&self, batch_id: BatchId) -> Result<BatchSummary, PipelineError> {
        let state = self.state(batch_id).await?;

        let pending = state
            .items
            .iter()
            .filter(|i| i.status != ItemStatus::Success)
            .count();
        tracing::info!(batch_id = %batch_id, pending, "batch resumed");
        self.process(state).await
    }

    /// Load the persisted state of a batch
    ///
    /// # Errors
    /// `UnknownRun` when no `batch.json` exists for the ID.
    pub async fn state(&self, batch_id: BatchId) -> Result<BatchState, PipelineError> {
        let path = self.batch_dir(batch_id).join("batch.json");
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|source| PipelineError::Io {
                path: path.clone(),
                source,
            })?
        {
            return Err(PipelineError::UnknownRun(path));
        }
        read_json(&path).await
    }

    /// Process every non-successful item, persisting state after each
    ///
    /// Each attempt is given its run ID before any stage executes, so a
    /// failed item still points at the run directory holding its surviving
    /// checkpoints.
    async fn process(&self, mut state: BatchState) -> Result<BatchSummary, PipelineError> {
        let dir = self.batch_dir(state.batch_id);
        let state_path = dir.join("batch.json");

        for position in 0..state.items.len() {
            if state.items[position].status == ItemStatus::Success {
                continue;
            }

            let input = state.items[position].input.clone();
            let started = Instant::now();
            let outcome = match self.coordinator.store().init_run().await {
                Ok(metadata) => {
                    let run_id = metadata.run_id;
                    state.items[position].run_id = Some(run_id);
                    self.coordinator
                        .run_range(run_id, &input, Stage::ScenarioSynthesis, Stage::ReportSynthesis)
                        .await
                        .map(|()| run_id)
                }
                Err(err) => Err(err),
            };
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let item = &mut state.items[position];
            item.duration_ms = elapsed;
            match outcome {
                Ok(run_id) => {
                    item.status = ItemStatus::Success;
                    item.error = None;
                    tracing::info!(index = item.index, %run_id, "item completed");
                }
                Err(err) if err.is_fatal() => {
                    item.status = ItemStatus::Failed;
                    item.error = Some(err.to_string());
                    tracing::error!(index = item.index, %err, "fatal error, aborting batch");
                    write_json(&state_path, &state).await?;
                    return Err(PipelineError::BatchAborted {
                        batch_id: state.batch_id,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    item.status = ItemStatus::Failed;
                    item.error = Some(err.to_string());
                    tracing::warn!(index = item.index, %err, "item failed, continuing");
                }
            }
            write_json(&state_path, &state).await?;
        }

        let summary = state.summary();
        write_json(&dir.join("summary.json"), &summary).await?;
        tracing::info!(
            batch_id = %state.batch_id,
            successes = summary.successes,
            failures = summary.failures,
            "batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(successes: usize, failures: usize) -> BatchSummary {
        BatchSummary {
            batch_id: BatchId::new(),
            total: successes + failures,
            successes,
            failures,
            items: Vec::new(),
        }
    }

    #[test]
    fn exit_code_tri_state() {
        assert_eq!(summary(10, 0).exit_code(), 0);
        assert_eq!(summary(9, 1).exit_code(), 1);
        assert_eq!(summary(0, 10).exit_code(), 2);
        assert_eq!(summary(0, 0).exit_code(), 0);
    }

    #[test]
    fn batch_id_round_trips() {
        let id = BatchId::new();
        let back: BatchId = id.to_string().parse().unwrap();
        assert_eq!(id, back);
    }
}
