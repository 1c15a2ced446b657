//! Evaluation results
//!
//! One result per assertion per plan. Structural results carry presence
//! evidence; grounding results additionally separate the values found in the
//! plan from the mismatches against the scenario. A fabricated value always
//! lands in `mismatches`, never silently in `values_found`.

use pqa_assertion::AssertionId;
use serde::{Deserialize, Serialize};

/// A text span supporting a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    /// Quoted plan text
    pub text: String,
    /// Relevance/confidence in [0, 1]
    pub confidence: f64,
}

impl EvidenceSpan {
    /// Create a span, clamping confidence into [0, 1]
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Verdict for one assertion against one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The assertion evaluated
    pub assertion_id: AssertionId,
    /// Pass/fail under the assertion's layer discipline
    pub passed: bool,
    /// Human-readable reasoning
    pub explanation: String,
    /// Supporting spans (first match only for structural checks)
    pub evidence: Vec<EvidenceSpan>,
    /// Values the plan claims for the grounding concern
    pub values_found: Vec<String>,
    /// Plan values absent from (or contradicting) the scenario
    pub mismatches: Vec<String>,
}

impl EvaluationResult {
    /// Failed result with an explanation and no evidence
    #[must_use]
    pub fn failed(assertion_id: AssertionId, explanation: impl Into<String>) -> Self {
        Self {
            assertion_id,
            passed: false,
            explanation: explanation.into(),
            evidence: Vec::new(),
            values_found: Vec::new(),
            mismatches: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(EvidenceSpan::new("x", 1.7).confidence, 1.0);
        assert_eq!(EvidenceSpan::new("x", -0.2).confidence, 0.0);
    }

    #[test]
    fn failed_constructor() {
        let result = EvaluationResult::failed(AssertionId::new(), "bad shape");
        assert!(!result.passed);
        assert!(result.evidence.is_empty());
    }
}
