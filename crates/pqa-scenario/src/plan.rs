//! Plan under test
//!
//! A plan is a body of text plus a declared quality tier. Non-top tiers
//! carry the list of defects deliberately injected at synthesis time, used
//! to validate the evaluator against known pass/fail combinations.

use serde::{Deserialize, Serialize};

/// Target quality tier for synthesized plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Satisfies the assertion set as well as the oracle can manage
    Top,
    /// One structural omission and one grounding fabrication
    Mid,
    /// Multiple omissions and fabrications, including a date mismatch
    Low,
}

impl QualityTier {
    /// All tiers, best first
    pub const ALL: [Self; 3] = [Self::Top, Self::Mid, Self::Low];

    /// Stable name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kind of deliberately injected defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An expected element family is left out entirely
    StructuralOmission,
    /// A name is used that does not exist in the scenario
    FabricatedName,
    /// The stated date/time disagrees with the scenario schedule
    DateMismatch,
    /// An artifact is referenced that the scenario does not contain
    FabricatedArtifact,
}

/// One deliberately injected defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliberateIssue {
    /// Defect family
    pub kind: IssueKind,
    /// What was injected, for regression bookkeeping
    pub description: String,
}

impl DeliberateIssue {
    /// Create an issue record
    #[inline]
    #[must_use]
    pub fn new(kind: IssueKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

/// The artifact under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan body
    pub text: String,
    /// Declared tier
    pub quality_tier: QualityTier,
    /// Injected defects (empty for top tier)
    pub deliberate_issues: Vec<DeliberateIssue>,
}

impl Plan {
    /// Plan with no injected defects
    #[inline]
    #[must_use]
    pub fn top(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quality_tier: QualityTier::Top,
            deliberate_issues: Vec::new(),
        }
    }
}
