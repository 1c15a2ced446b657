//! Plan evaluator
//!
//! Runs one assertion at a time against (scenario, plan) with one oracle
//! call each. The instruction template enforces the discipline split:
//! - structural checks ask only whether the element family is present
//! - grounding checks ask only whether present values match the scenario
//!
//! The evaluator, not the oracle, refuses conflation: a reply whose declared
//! check kind disagrees with the assertion's layer is rejected as
//! `passed=false` with an invalid-shape explanation.

use crate::result::{EvaluationResult, EvidenceSpan};
use pqa_assertion::{AssertionRecord, AssertionSet};
use pqa_oracle::{OracleClient, OracleError, OracleReply, OracleRequest};
use pqa_scenario::{Plan, Scenario};
use pqa_taxonomy::{Catalog, DimensionId, Layer};
use serde_json::Value;
use std::sync::Arc;

/// Oracle-backed evaluator for assertions against one plan
pub struct PlanEvaluator {
    oracle: Arc<OracleClient>,
    catalog: Arc<Catalog>,
}

impl std::fmt::Debug for PlanEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanEvaluator").finish()
    }
}

impl PlanEvaluator {
    /// Create an evaluator over an oracle client and catalog
    #[inline]
    #[must_use]
    pub fn new(oracle: Arc<OracleClient>, catalog: Arc<Catalog>) -> Self {
        Self { oracle, catalog }
    }

    /// Evaluate one assertion
    ///
    /// # Errors
    /// Oracle failures only; malformed replies become failed results.
    pub async fn evaluate(
        &self,
        assertion: &AssertionRecord,
        plan: &Plan,
        scenario: &Scenario,
    ) -> Result<EvaluationResult, OracleError> {
        let request = match assertion.layer {
            Layer::Structural => structural_request(assertion, plan),
            Layer::Grounding => grounding_request(assertion, plan, scenario, &self.catalog),
        };
        let reply = self.oracle.invoke(&request).await?;
        Ok(interpret(assertion, &reply))
    }

    /// Evaluate every assertion in the set, in order
    ///
    /// # Errors
    /// The first oracle failure aborts the remainder; callers at the batch
    /// level record it as a per-item failure.
    pub async fn evaluate_all(
        &self,
        assertions: &AssertionSet,
        plan: &Plan,
        scenario: &Scenario,
    ) -> Result<Vec<EvaluationResult>, OracleError> {
        let mut results = Vec::with_capacity(assertions.len());
        for assertion in assertions.iter() {
            let result = self.evaluate(assertion, plan, scenario).await?;
            tracing::debug!(
                assertion = %assertion.id,
                dimension = assertion.dimension.id(),
                passed = result.passed,
                "assertion evaluated"
            );
            results.push(result);
        }
        Ok(results)
    }
}

/// Presence-only instruction for a structural assertion
fn structural_request(assertion: &AssertionRecord, plan: &Plan) -> OracleRequest {
    OracleRequest::new(format!(
        "Check only whether the plan CONTAINS the element family described by \
         the assertion. Do not judge whether any value is correct; presence of \
         a wrong value still counts as present. Reply with JSON: {{\"check\": \
         \"structural\", \"passed\": bool, \"explanation\": ..., \"evidence\": \
         [{{\"text\": ..., \"confidence\": ...}}]}}.\n\nAssertion:\n{}\n\nPlan:\n{}\n",
        assertion.text, plan.text
    ))
    .with_temperature(0.0)
}

/// Accuracy-only instruction for a grounding assertion
fn grounding_request(
    assertion: &AssertionRecord,
    plan: &Plan,
    scenario: &Scenario,
    catalog: &Catalog,
) -> OracleRequest {
    let source_field = catalog
        .info(assertion.dimension)
        .source_field
        .unwrap_or("unknown");
    let authoritative = scenario.values_for(source_field);

    OracleRequest::new(format!(
        "Extract the plan's claimed values for the concern below and compare \
         them against the authoritative values. Judge only accuracy, not \
         presence. Every plan value absent from the authoritative list is a \
         mismatch. Reply with JSON: {{\"check\": \"grounding\", \"passed\": \
         bool, \"explanation\": ..., \"evidence\": [{{\"text\": ..., \
         \"confidence\": ...}}], \"values_found\": [...], \"mismatches\": \
         [...]}}.\n\nConcern:\n{}\n\nAuthoritative {source_field}:\n{}\n\nPlan:\n{}\n",
        assertion.text,
        authoritative.join(", "),
        plan.text
    ))
    .with_temperature(0.0)
}

/// Interpret the oracle reply under the assertion's layer discipline
///
/// Pure function of (assertion, reply). Never errors: invalid shapes become
/// failed results with an explanation naming the problem.
fn interpret(assertion: &AssertionRecord, reply: &OracleReply) -> EvaluationResult {
    let Some(Value::Object(map)) = reply.as_structured() else {
        return EvaluationResult::failed(
            assertion.id,
            "invalid evaluation shape: reply is not a structured object",
        );
    };

    // The declared check kind must match the assertion's layer; a grounding
    // judgment must never masquerade as a structural one or vice versa.
    let declared = map.get("check").and_then(Value::as_str);
    let expected = match assertion.layer {
        Layer::Structural => "structural",
        Layer::Grounding => "grounding",
    };
    if declared != Some(expected) {
        return EvaluationResult::failed(
            assertion.id,
            format!(
                "invalid evaluation shape: expected '{expected}' check, reply declared {declared:?}"
            ),
        );
    }

    let Some(reported) = map.get("passed").and_then(Value::as_bool) else {
        return EvaluationResult::failed(
            assertion.id,
            "invalid evaluation shape: missing boolean 'passed'",
        );
    };

    let explanation = map
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let mut evidence = parse_evidence(map.get("evidence"));
    let values_found = parse_strings(map.get("values_found"));
    let mismatches = parse_strings(map.get("mismatches"));

    match assertion.layer {
        Layer::Structural => {
            // Presence-only: evidence of the element family suffices, even if
            // the matched value is wrong. Keep the first span.
            evidence.truncate(1);
            let passed = reported || !evidence.is_empty();
            if !mismatches.is_empty() {
                tracing::warn!(
                    assertion = %assertion.id,
                    "structural reply carried mismatches; discarded"
                );
            }
            EvaluationResult {
                assertion_id: assertion.id,
                passed,
                explanation,
                evidence,
                values_found: Vec::new(),
                mismatches: Vec::new(),
            }
        }
        Layer::Grounding => {
            // Accuracy-only: any fabricated value forces failure.
            let passed = reported && mismatches.is_empty();
            EvaluationResult {
                assertion_id: assertion.id,
                passed,
                explanation,
                evidence,
                values_found,
                mismatches,
            }
        }
    }
}

fn parse_evidence(value: Option<&Value>) -> Vec<EvidenceSpan> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let text = item.get("text")?.as_str()?;
            let confidence = item
                .get("confidence")
                .and_then(Value::as_f64)
                .unwrap_or(0.5);
            Some(EvidenceSpan::new(text, confidence))
        })
        .collect()
}

fn parse_strings(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect()
}
