//! Score aggregation
//!
//! Combines per-assertion verdicts into a weighted score and an overall
//! verdict category. Per-assertion scores are 0 or 2 (a partial value of 1
//! is reserved in the model but not produced by this evaluator), so
//! `weighted_score = Σ(score_i · w_i) / Σ(2 · w_i)` lands in [0, 1].

use crate::result::EvaluationResult;
use pqa_assertion::{AssertionRecord, AssertionSet};
use pqa_taxonomy::Layer;
use serde::{Deserialize, Serialize};

/// Reserved per-assertion score values
const SCORE_PASS: u32 = 2;
const SCORE_FAIL: u32 = 0;

/// Aggregation thresholds
///
/// Configuration, not hard-coded business law; 0.8 is the default for both
/// layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Minimum structural pass-rate for a pass verdict
    pub structural_threshold: f64,
    /// Minimum grounding pass-rate for a pass verdict
    pub grounding_threshold: f64,
}

impl ScoreConfig {
    /// Default thresholds (0.8 / 0.8)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With both thresholds
    #[inline]
    #[must_use]
    pub fn with_thresholds(mut self, structural: f64, grounding: f64) -> Self {
        self.structural_threshold = structural;
        self.grounding_threshold = grounding;
        self
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            structural_threshold: 0.8,
            grounding_threshold: 0.8,
        }
    }
}

/// Overall verdict category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Both pass-rates at or above threshold
    Pass,
    /// Structural rate below threshold, grounding rate at or above
    FailStructure,
    /// Grounding rate below threshold, structural rate at or above
    FailGrounding,
    /// Both rates below threshold
    FailBoth,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pass => "pass",
            Self::FailStructure => "fail_structure",
            Self::FailGrounding => "fail_grounding",
            Self::FailBoth => "fail_both",
        };
        write!(f, "{name}")
    }
}

/// Aggregated quality report for one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Weighted score in [0, 1]
    pub weighted_score: f64,
    /// Overall verdict
    pub verdict: Verdict,
    /// Structural pass-rate (1.0 when no structural assertions exist)
    pub structural_pass_rate: f64,
    /// Grounding pass-rate (1.0 when no grounding assertions exist)
    pub grounding_pass_rate: f64,
    /// Assertions passed
    pub passed: usize,
    /// Assertions evaluated
    pub total: usize,
    /// Derived meta-layer aggregate: union of all grounding mismatches
    ///
    /// Read-only view over grounding results, not a first-class assertion.
    pub hallucination_summary: Vec<String>,
}

/// Aggregate per-assertion results into a report
///
/// An assertion with no matching result counts as a failure: losing a result
/// must never inflate the score.
#[must_use]
pub fn aggregate(
    assertions: &AssertionSet,
    results: &[EvaluationResult],
    config: &ScoreConfig,
) -> ScoreReport {
    let result_for = |record: &AssertionRecord| -> Option<&EvaluationResult> {
        results.iter().find(|r| r.assertion_id == record.id)
    };
    let passed_for =
        |record: &AssertionRecord| result_for(record).map(|r| r.passed).unwrap_or(false);

    let mut score_numerator: u64 = 0;
    let mut score_denominator: u64 = 0;
    let mut passed_count = 0usize;

    let mut structural_total = 0usize;
    let mut structural_passed = 0usize;
    let mut grounding_total = 0usize;
    let mut grounding_passed = 0usize;

    for record in assertions.iter() {
        let passed = passed_for(record);
        let score = if passed { SCORE_PASS } else { SCORE_FAIL };
        score_numerator += u64::from(score * record.weight);
        score_denominator += u64::from(2 * record.weight);

        if passed {
            passed_count += 1;
        }
        match record.layer {
            Layer::Structural => {
                structural_total += 1;
                if passed {
                    structural_passed += 1;
                }
            }
            Layer::Grounding => {
                grounding_total += 1;
                if passed {
                    grounding_passed += 1;
                }
            }
        }
    }

    let rate = |passed: usize, total: usize| -> f64 {
        if total == 0 {
            // Vacuous: nothing in the layer to fail.
            1.0
        } else {
            passed as f64 / total as f64
        }
    };
    let structural_pass_rate = rate(structural_passed, structural_total);
    let grounding_pass_rate = rate(grounding_passed, grounding_total);

    let weighted_score = if score_denominator == 0 {
        1.0
    } else {
        score_numerator as f64 / score_denominator as f64
    };

    let structural_ok = structural_pass_rate >= config.structural_threshold;
    let grounding_ok = grounding_pass_rate >= config.grounding_threshold;
    let verdict = match (structural_ok, grounding_ok) {
        (true, true) => Verdict::Pass,
        (false, true) => Verdict::FailStructure,
        (true, false) => Verdict::FailGrounding,
        (false, false) => Verdict::FailBoth,
    };

    // Meta-layer hallucination aggregate: grounding mismatches, deduplicated,
    // in evaluation order.
    let mut hallucination_summary: Vec<String> = Vec::new();
    for record in assertions.grounding() {
        if let Some(result) = result_for(record) {
            for mismatch in &result.mismatches {
                if !hallucination_summary.contains(mismatch) {
                    hallucination_summary.push(mismatch.clone());
                }
            }
        }
    }

    ScoreReport {
        weighted_score,
        verdict,
        structural_pass_rate,
        grounding_pass_rate,
        passed: passed_count,
        total: assertions.len(),
        hallucination_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::EvaluationResult;
    use pqa_assertion::AssertionId;
    use pqa_taxonomy::{Catalog, DimensionId, GroundingDimension, StructuralDimension};
    use proptest::prelude::*;

    fn passing(id: AssertionId) -> EvaluationResult {
        EvaluationResult {
            assertion_id: id,
            passed: true,
            explanation: "ok".to_string(),
            evidence: Vec::new(),
            values_found: Vec::new(),
            mismatches: Vec::new(),
        }
    }

    fn failing(id: AssertionId, mismatches: &[&str]) -> EvaluationResult {
        EvaluationResult {
            assertion_id: id,
            passed: false,
            explanation: "no".to_string(),
            evidence: Vec::new(),
            values_found: mismatches.iter().map(|s| s.to_string()).collect(),
            mismatches: mismatches.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn mixed_set() -> (AssertionSet, Vec<AssertionId>) {
        let catalog = Catalog::load().unwrap();
        let mut set = AssertionSet::new();
        let s2 = set.insert_primary(
            &catalog,
            StructuralDimension::AttendeesListed.into(),
            "attendees listed",
            "o",
        );
        let g1 = set
            .insert_grounding(
                &catalog,
                s2,
                GroundingDimension::AttendeeGrounding,
                "attendees grounded",
                "o",
            )
            .unwrap();
        let s8 = set.insert_primary(
            &catalog,
            StructuralDimension::RisksAnticipated.into(),
            "risks noted",
            "o",
        );
        (set, vec![s2, g1, s8])
    }

    #[test]
    fn all_pass_scores_one() {
        let (set, ids) = mixed_set();
        let results: Vec<_> = ids.iter().map(|id| passing(*id)).collect();
        let report = aggregate(&set, &results, &ScoreConfig::default());

        assert!((report.weighted_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.passed, 3);
    }

    #[test]
    fn all_fail_scores_zero() {
        let (set, ids) = mixed_set();
        let results: Vec<_> = ids.iter().map(|id| failing(*id, &[])).collect();
        let report = aggregate(&set, &results, &ScoreConfig::default());

        assert!(report.weighted_score.abs() < f64::EPSILON);
        assert_eq!(report.verdict, Verdict::FailBoth);
    }

    #[test]
    fn grounding_failure_alone_yields_fail_grounding() {
        let (set, ids) = mixed_set();
        let results = vec![
            passing(ids[0]),
            failing(ids[1], &["Casey Nolan"]),
            passing(ids[2]),
        ];
        let report = aggregate(&set, &results, &ScoreConfig::default());

        assert_eq!(report.verdict, Verdict::FailGrounding);
        assert_eq!(report.structural_pass_rate, 1.0);
        assert_eq!(report.grounding_pass_rate, 0.0);
    }

    #[test]
    fn structural_failure_alone_yields_fail_structure() {
        let (set, ids) = mixed_set();
        let results = vec![failing(ids[0], &[]), passing(ids[1]), failing(ids[2], &[])];
        let report = aggregate(&set, &results, &ScoreConfig::default());
        assert_eq!(report.verdict, Verdict::FailStructure);
    }

    #[test]
    fn missing_result_counts_as_failure() {
        let (set, ids) = mixed_set();
        let results = vec![passing(ids[0]), passing(ids[1])]; // s8 missing
        let report = aggregate(&set, &results, &ScoreConfig::default());

        assert_eq!(report.passed, 2);
        assert!(report.weighted_score < 1.0);
    }

    #[test]
    fn hallucination_summary_unions_mismatches() {
        let catalog = Catalog::load().unwrap();
        let mut set = AssertionSet::new();
        let s5 = set.insert_primary(
            &catalog,
            StructuralDimension::TaskOwnership.into(),
            "owners",
            "o",
        );
        let g1 = set
            .insert_grounding(
                &catalog,
                s5,
                GroundingDimension::AttendeeGrounding,
                "owners grounded",
                "o",
            )
            .unwrap();
        let standalone = set.insert_primary(
            &catalog,
            DimensionId::Grounding(GroundingDimension::ArtifactGrounding),
            "artifacts grounded",
            "o",
        );

        let results = vec![
            passing(s5),
            failing(g1, &["Casey Nolan", "Riley Fabricant"]),
            failing(standalone, &["final_v9.pptx", "Casey Nolan"]),
        ];
        let report = aggregate(&set, &results, &ScoreConfig::default());

        assert_eq!(
            report.hallucination_summary,
            vec!["Casey Nolan", "Riley Fabricant", "final_v9.pptx"]
        );
    }

    #[test]
    fn empty_set_is_vacuously_perfect() {
        let report = aggregate(&AssertionSet::new(), &[], &ScoreConfig::default());
        assert_eq!(report.weighted_score, 1.0);
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn custom_thresholds_are_honored() {
        let (set, ids) = mixed_set();
        // One of two structural assertions fails: structural rate 0.5
        let results = vec![passing(ids[0]), passing(ids[1]), failing(ids[2], &[])];

        let strict = ScoreConfig::default().with_thresholds(0.9, 0.9);
        assert_eq!(aggregate(&set, &results, &strict).verdict, Verdict::FailStructure);

        let lenient = ScoreConfig::default().with_thresholds(0.5, 0.5);
        assert_eq!(aggregate(&set, &results, &lenient).verdict, Verdict::Pass);
    }

    proptest! {
        #[test]
        fn weighted_score_is_always_in_unit_interval(
            outcomes in proptest::collection::vec((0usize..8, any::<bool>()), 0..32)
        ) {
            let catalog = Catalog::load().unwrap();
            let mut set = AssertionSet::new();
            let mut results = Vec::new();
            for (dim_index, passed) in outcomes {
                let dimension = StructuralDimension::ALL[dim_index];
                let id = set.insert_primary(&catalog, dimension.into(), "claim", "o");
                results.push(if passed { passing(id) } else { failing(id, &[]) });
            }

            let report = aggregate(&set, &results, &ScoreConfig::default());
            prop_assert!(report.weighted_score >= 0.0);
            prop_assert!(report.weighted_score <= 1.0);
        }
    }
}
