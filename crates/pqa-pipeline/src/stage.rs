//! Pipeline stages
//!
//! Five stages in a fixed order, each reading the previous stage's persisted
//! output and writing exactly one JSON file into the run directory. The
//! output file doubles as the checkpoint: a stage whose file already exists
//! is skipped on resume.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Invent the ground-truth scenario from the seed input
    ScenarioSynthesis,
    /// Decompose and classify the input into an assertion set
    AssertionGeneration,
    /// Generate one plan per quality tier
    PlanSynthesis,
    /// Evaluate every assertion against every plan
    PlanEvaluation,
    /// Aggregate per-plan score reports
    ReportSynthesis,
}

impl Stage {
    /// All stages, pipeline order
    pub const ALL: [Self; 5] = [
        Self::ScenarioSynthesis,
        Self::AssertionGeneration,
        Self::PlanSynthesis,
        Self::PlanEvaluation,
        Self::ReportSynthesis,
    ];

    /// Stable name, used in run metadata and on the CLI
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScenarioSynthesis => "scenario",
            Self::AssertionGeneration => "assertions",
            Self::PlanSynthesis => "plans",
            Self::PlanEvaluation => "evaluations",
            Self::ReportSynthesis => "report",
        }
    }

    /// Checkpoint file this stage writes into the run directory
    #[inline]
    #[must_use]
    pub fn output_file(&self) -> &'static str {
        match self {
            Self::ScenarioSynthesis => "scenario.json",
            Self::AssertionGeneration => "assertions.json",
            Self::PlanSynthesis => "plans.json",
            Self::PlanEvaluation => "evaluations.json",
            Self::ReportSynthesis => "report.json",
        }
    }

    /// Stage whose output this stage reads, if any
    #[inline]
    #[must_use]
    pub fn prerequisite(&self) -> Option<Self> {
        match self {
            Self::ScenarioSynthesis => None,
            Self::AssertionGeneration => Some(Self::ScenarioSynthesis),
            Self::PlanSynthesis => Some(Self::AssertionGeneration),
            Self::PlanEvaluation => Some(Self::PlanSynthesis),
            Self::ReportSynthesis => Some(Self::PlanEvaluation),
        }
    }

    /// Position in pipeline order, zero-based
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}

/// Recorded outcome of one stage within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Ran and wrote its output
    Success,
    /// Attempted and failed; later stages were not run
    Failed,
    /// Output already existed, stage not re-run
    Skipped,
}
