//! Run coordinator
//!
//! Drives the five stages in order over one run directory. Each stage reads
//! its prerequisite's checkpoint from disk rather than from memory, so a run
//! can be stopped and resumed at any stage boundary. A failed stage halts
//! the run without rolling back earlier checkpoints.

use crate::error::PipelineError;
use crate::stage::{Stage, StageStatus};
use crate::state::{RunId, RunStatus, RunStore};
use pqa_assertion::{AssertionClassifier, AssertionSet};
use pqa_evaluator::{aggregate, EvaluationResult, PlanEvaluator, ScoreConfig, ScoreReport};
use pqa_oracle::OracleClient;
use pqa_scenario::{Plan, PlanSynthesizer, QualityTier, Scenario, ScenarioSynthesizer};
use pqa_taxonomy::Catalog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-tier evaluation results, the checkpoint of the evaluation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierEvaluation {
    /// Tier of the evaluated plan
    pub tier: QualityTier,
    /// One result per assertion, in assertion order
    pub results: Vec<EvaluationResult>,
}

/// Per-tier score report, the checkpoint of the report stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierReport {
    /// Tier of the scored plan
    pub tier: QualityTier,
    /// Aggregated report
    pub report: ScoreReport,
}

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Intent handed to the plan synthesizer
    pub intent: String,
    /// Quality tiers to synthesize and evaluate
    pub tiers: Vec<QualityTier>,
    /// Aggregation thresholds
    pub score: ScoreConfig,
    /// Skip a stage when its checkpoint already exists
    pub skip_existing: bool,
}

impl PipelineConfig {
    /// Default configuration: all tiers, default thresholds, skip existing
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a plan-synthesis intent
    #[inline]
    #[must_use]
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    /// With an explicit tier list
    #[inline]
    #[must_use]
    pub fn with_tiers(mut self, tiers: Vec<QualityTier>) -> Self {
        self.tiers = tiers;
        self
    }

    /// With aggregation thresholds
    #[inline]
    #[must_use]
    pub fn with_score(mut self, score: ScoreConfig) -> Self {
        self.score = score;
        self
    }

    /// Force stages to re-run even when their checkpoint exists
    #[inline]
    #[must_use]
    pub fn with_overwrite(mut self) -> Self {
        self.skip_existing = false;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intent: "Produce a complete meeting plan for the scenario.".to_string(),
            tiers: QualityTier::ALL.to_vec(),
            score: ScoreConfig::default(),
            skip_existing: true,
        }
    }
}

/// Drives one run through the stage chain
pub struct RunCoordinator {
    store: RunStore,
    oracle: Arc<OracleClient>,
    catalog: Arc<Catalog>,
    config: PipelineConfig,
}

impl std::fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

impl RunCoordinator {
    /// Create a coordinator
    #[inline]
    #[must_use]
    pub fn new(
        store: RunStore,
        oracle: Arc<OracleClient>,
        catalog: Arc<Catalog>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            catalog,
            config,
        }
    }

    /// Run store backing this coordinator
    #[inline]
    #[must_use]
    pub fn store(&self) -> &RunStore {
        &self.store
    }

    /// Create a run and drive all five stages
    ///
    /// # Errors
    /// The first stage failure; earlier checkpoints stay on disk.
    pub async fn run_all(&self, input: &str) -> Result<RunId, PipelineError> {
        let run_id = self.store.init_run().await?.run_id;
        self.run_range(run_id, input, Stage::ScenarioSynthesis, Stage::ReportSynthesis)
            .await?;
        Ok(run_id)
    }

    /// Drive a contiguous span of stages on an existing run
    ///
    /// # Errors
    /// `MissingPrerequisite` when the stage before `from` has no checkpoint;
    /// otherwise the first stage failure.
    pub async fn run_range(
        &self,
        run_id: RunId,
        input: &str,
        from: Stage,
        to: Stage,
    ) -> Result<(), PipelineError> {
        for stage in Stage::ALL {
            if stage.index() < from.index() || stage.index() > to.index() {
                continue;
            }
            if let Err(err) = self.execute_stage(run_id, input, stage).await {
                tracing::error!(run_id = %run_id, %stage, %err, "stage failed, halting run");
                self.store
                    .record_stage(run_id, stage, StageStatus::Failed)
                    .await?;
                return Err(err);
            }
        }
        if to == Stage::ReportSynthesis {
            self.store.finalize(run_id, RunStatus::Completed).await?;
        }
        Ok(())
    }

    /// Resume an interrupted run from its first missing checkpoint
    ///
    /// Stages whose checkpoints already exist are left untouched.
    ///
    /// # Errors
    /// `UnknownRun` for an ID with no run directory; otherwise as
    /// [`Self::run_range`].
    pub async fn resume(&self, run_id: RunId, input: &str) -> Result<(), PipelineError> {
        // Confirms the run exists before touching stage files.
        let _ = self.store.load_metadata(run_id).await?;

        let mut first_missing = None;
        for stage in Stage::ALL {
            if !self.store.stage_exists(run_id, stage).await? {
                first_missing = Some(stage);
                break;
            }
        }
        let Some(from) = first_missing else {
            tracing::info!(run_id = %run_id, "all checkpoints present, nothing to resume");
            self.store.finalize(run_id, RunStatus::Completed).await?;
            return Ok(());
        };

        tracing::info!(run_id = %run_id, from = %from, "resuming run");
        self.run_range(run_id, input, from, Stage::ReportSynthesis)
            .await
    }

    /// Execute one stage, honoring skip-if-exists and the prerequisite chain
    async fn execute_stage(
        &self,
        run_id: RunId,
        input: &str,
        stage: Stage,
    ) -> Result<(), PipelineError> {
        if let Some(prerequisite) = stage.prerequisite() {
            if !self.store.stage_exists(run_id, prerequisite).await? {
                return Err(PipelineError::MissingPrerequisite {
                    stage,
                    missing: prerequisite,
                });
            }
        }
        if self.config.skip_existing && self.store.stage_exists(run_id, stage).await? {
            tracing::info!(run_id = %run_id, %stage, "checkpoint exists, skipping");
            self.store
                .record_stage(run_id, stage, StageStatus::Skipped)
                .await?;
            return Ok(());
        }

        tracing::info!(run_id = %run_id, %stage, "running stage");
        match stage {
            Stage::ScenarioSynthesis => self.synthesize_scenario(run_id, input).await?,
            Stage::AssertionGeneration => self.generate_assertions(run_id, input).await?,
            Stage::PlanSynthesis => self.synthesize_plans(run_id).await?,
            Stage::PlanEvaluation => self.evaluate_plans(run_id).await?,
            Stage::ReportSynthesis => self.synthesize_report(run_id).await?,
        }
        self.store
            .record_stage(run_id, stage, StageStatus::Success)
            .await
    }

    async fn synthesize_scenario(&self, run_id: RunId, input: &str) -> Result<(), PipelineError> {
        let synthesizer = ScenarioSynthesizer::new(Arc::clone(&self.oracle));
        let scenario = synthesizer.synthesize(input).await?;
        self.store
            .write_stage(run_id, Stage::ScenarioSynthesis, &scenario)
            .await
    }

    async fn generate_assertions(&self, run_id: RunId, input: &str) -> Result<(), PipelineError> {
        let scenario: Scenario = self
            .store
            .read_stage(run_id, Stage::AssertionGeneration, Stage::ScenarioSynthesis)
            .await?;
        let classifier =
            AssertionClassifier::new(Arc::clone(&self.oracle), Arc::clone(&self.catalog));
        let assertions = classifier.decompose(input, Some(&scenario.summary())).await?;
        self.store
            .write_stage(run_id, Stage::AssertionGeneration, &assertions)
            .await
    }

    async fn synthesize_plans(&self, run_id: RunId) -> Result<(), PipelineError> {
        let scenario: Scenario = self
            .store
            .read_stage(run_id, Stage::PlanSynthesis, Stage::ScenarioSynthesis)
            .await?;
        let assertions = self.read_assertions(run_id, Stage::PlanSynthesis).await?;

        let synthesizer = PlanSynthesizer::new(Arc::clone(&self.oracle));
        let mut plans = Vec::with_capacity(self.config.tiers.len());
        for tier in &self.config.tiers {
            let plan = synthesizer
                .synthesize(&scenario, &self.config.intent, &assertions, *tier)
                .await?;
            plans.push(plan);
        }
        self.store
            .write_stage(run_id, Stage::PlanSynthesis, &plans)
            .await
    }

    async fn evaluate_plans(&self, run_id: RunId) -> Result<(), PipelineError> {
        let scenario: Scenario = self
            .store
            .read_stage(run_id, Stage::PlanEvaluation, Stage::ScenarioSynthesis)
            .await?;
        let assertions = self.read_assertions(run_id, Stage::PlanEvaluation).await?;
        let plans: Vec<Plan> = self
            .store
            .read_stage(run_id, Stage::PlanEvaluation, Stage::PlanSynthesis)
            .await?;

        let evaluator = PlanEvaluator::new(Arc::clone(&self.oracle), Arc::clone(&self.catalog));
        let mut evaluations = Vec::with_capacity(plans.len());
        for plan in &plans {
            let results = evaluator.evaluate_all(&assertions, plan, &scenario).await?;
            evaluations.push(TierEvaluation {
                tier: plan.quality_tier,
                results,
            });
        }
        self.store
            .write_stage(run_id, Stage::PlanEvaluation, &evaluations)
            .await
    }

    /// Aggregation only; the report stage makes no oracle calls
    async fn synthesize_report(&self, run_id: RunId) -> Result<(), PipelineError> {
        let assertions = self.read_assertions(run_id, Stage::ReportSynthesis).await?;
        let evaluations: Vec<TierEvaluation> = self
            .store
            .read_stage(run_id, Stage::ReportSynthesis, Stage::PlanEvaluation)
            .await?;

        let reports: Vec<TierReport> = evaluations
            .iter()
            .map(|evaluation| TierReport {
                tier: evaluation.tier,
                report: aggregate(&assertions, &evaluation.results, &self.config.score),
            })
            .collect();
        for report in &reports {
            tracing::info!(
                run_id = %run_id,
                tier = %report.tier,
                verdict = %report.report.verdict,
                score = report.report.weighted_score,
                "plan scored"
            );
        }
        self.store
            .write_stage(run_id, Stage::ReportSynthesis, &reports)
            .await
    }

    /// Read the assertion checkpoint and re-validate its forest invariants
    async fn read_assertions(
        &self,
        run_id: RunId,
        requested_by: Stage,
    ) -> Result<AssertionSet, PipelineError> {
        let assertions: AssertionSet = self
            .store
            .read_stage(run_id, requested_by, Stage::AssertionGeneration)
            .await?;
        assertions
            .validate(&self.catalog)
            .map_err(|err| PipelineError::InvalidArtifact {
                stage: Stage::AssertionGeneration,
                reason: err.to_string(),
            })?;
        Ok(assertions)
    }
}
