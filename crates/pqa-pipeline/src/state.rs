//! Run state persistence
//!
//! One directory per run under the store root, named by the run's ULID.
//! `run.json` holds the metadata record (per-stage status markers); each
//! stage writes its own checkpoint file next to it. Every write goes through
//! serde_json pretty printing so artifacts stay diffable across resumes.

use crate::error::PipelineError;
use crate::stage::{Stage, StageStatus};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use ulid::Ulid;

/// Unique run identifier (ULID, sortable by creation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate a new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, no terminal outcome yet
    Initialized,
    /// All requested stages succeeded (or were skipped)
    Completed,
    /// A stage failed; prior checkpoints are kept for resume
    Failed,
}

/// Metadata record persisted as `run.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Run identifier, doubles as the directory name
    pub run_id: RunId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Terminal state
    pub status: RunStatus,
    /// Per-stage outcomes, keyed by stage name, in execution order
    pub stages: IndexMap<String, StageStatus>,
}

impl RunMetadata {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            created_at: Utc::now(),
            status: RunStatus::Initialized,
            stages: IndexMap::new(),
        }
    }
}

/// Filesystem-backed store of run directories
#[derive(Debug, Clone)]
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    /// Store rooted at the given directory (created on first run)
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one run
    #[must_use]
    pub fn run_dir(&self, run_id: RunId) -> PathBuf {
        self.root.join(run_id.to_string())
    }

    /// Create a fresh run directory and its metadata record
    ///
    /// # Errors
    /// Io/serde failures.
    pub async fn init_run(&self) -> Result<RunMetadata, PipelineError> {
        let metadata = RunMetadata::new(RunId::new());
        let dir = self.run_dir(metadata.run_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| PipelineError::Io { path: dir, source })?;
        self.save_metadata(&metadata).await?;
        tracing::info!(run_id = %metadata.run_id, "run initialized");
        Ok(metadata)
    }

    /// Load the metadata record of an existing run
    ///
    /// # Errors
    /// `UnknownRun` if the run directory or `run.json` is missing.
    pub async fn load_metadata(&self, run_id: RunId) -> Result<RunMetadata, PipelineError> {
        let path = self.run_dir(run_id).join("run.json");
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

    /// Persist the metadata record
    ///
    /// # Errors
    /// Io/serde failures.
    pub async fn save_metadata(&self, metadata: &RunMetadata) -> Result<(), PipelineError> {
        let path = self.run_dir(metadata.run_id).join("run.json");
        write_json(&path, metadata).await
    }

    /// Record one stage's outcome in `run.json`
    ///
    /// # Errors
    /// Io/serde failures.
    pub async fn record_stage(
        &self,
        run_id: RunId,
        stage: Stage,
        status: StageStatus,
    ) -> Result<(), PipelineError> {
        let mut metadata = self.load_metadata(run_id).await?;
        metadata.stages.insert(stage.name().to_string(), status);
        if status == StageStatus::Failed {
            metadata.status = RunStatus::Failed;
        }
        self.save_metadata(&metadata).await
    }

    /// Mark a run's terminal status
    ///
    /// # Errors
    /// Io/serde failures.
    pub async fn finalize(&self, run_id: RunId, status: RunStatus) -> Result<(), PipelineError> {
        let mut metadata = self.load_metadata(run_id).await?;
        metadata.status = status;
        self.save_metadata(&metadata).await
    }

    /// True if the stage's checkpoint file exists
    ///
    /// # Errors
    /// Io failures only.
    pub async fn stage_exists(&self, run_id: RunId, stage: Stage) -> Result<bool, PipelineError> {
        let path = self.stage_path(run_id, stage);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| PipelineError::Io { path, source })
    }

    /// Path of a stage's checkpoint file
    #[must_use]
    pub fn stage_path(&self, run_id: RunId, stage: Stage) -> PathBuf {
        self.run_dir(run_id).join(stage.output_file())
    }

    /// Write a stage's checkpoint
    ///
    /// # Errors
    /// Io/serde failures.
    pub async fn write_stage<T: Serialize>(
        &self,
        run_id: RunId,
        stage: Stage,
        value: &T,
    ) -> Result<(), PipelineError> {
        write_json(&self.stage_path(run_id, stage), value).await
    }

    /// Read a stage's checkpoint, erroring when the prerequisite is absent
    ///
    /// # Errors
    /// `MissingPrerequisite` when the file does not exist; io/serde failures
    /// otherwise.
    pub async fn read_stage<T: DeserializeOwned>(
        &self,
        run_id: RunId,
        requested_by: Stage,
        stage: Stage,
    ) -> Result<T, PipelineError> {
        if !self.stage_exists(run_id, stage).await? {
            return Err(PipelineError::MissingPrerequisite {
                stage: requested_by,
                missing: stage,
            });
        }
        read_json(&self.stage_path(run_id, stage)).await
    }
}

/// Pretty-printed JSON write
pub(crate) async fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), PipelineError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| PipelineError::Serde {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// JSON read
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| PipelineError::Serde {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_directory_and_metadata() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());

        let metadata = store.init_run().await.unwrap();
        assert!(store.run_dir(metadata.run_id).join("run.json").exists());
        assert_eq!(metadata.status, RunStatus::Initialized);
        assert!(metadata.stages.is_empty());
    }

    #[tokio::test]
    async fn stage_status_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let run_id = store.init_run().await.unwrap().run_id;

        store
            .record_stage(run_id, Stage::ScenarioSynthesis, StageStatus::Success)
            .await
            .unwrap();
        store
            .record_stage(run_id, Stage::AssertionGeneration, StageStatus::Failed)
            .await
            .unwrap();

        let metadata = store.load_metadata(run_id).await.unwrap();
        assert_eq!(
            metadata.stages.get("scenario"),
            Some(&StageStatus::Success)
        );
        assert_eq!(metadata.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn missing_prerequisite_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let run_id = store.init_run().await.unwrap().run_id;

        let err = store
            .read_stage::<serde_json::Value>(
                run_id,
                Stage::AssertionGeneration,
                Stage::ScenarioSynthesis,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingPrerequisite {
                stage: Stage::AssertionGeneration,
                missing: Stage::ScenarioSynthesis,
            }
        ));
    }

    #[tokio::test]
    async fn stage_payload_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let run_id = store.init_run().await.unwrap().run_id;

        let payload = serde_json::json!({"attendees": ["Ava Chen"]});
        store
            .write_stage(run_id, Stage::ScenarioSynthesis, &payload)
            .await
            .unwrap();

        let back: serde_json::Value = store
            .read_stage(run_id, Stage::AssertionGeneration, Stage::ScenarioSynthesis)
            .await
            .unwrap();
        assert_eq!(back, payload);
    }

    #[tokio::test]
    async fn unknown_run_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let err = store.load_metadata(RunId::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownRun(_)));
    }
}
