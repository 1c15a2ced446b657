//! Assertion decomposer/classifier
//!
//! Turns one free-form assertion string into atomic, linked assertion
//! records:
//! 1. one oracle call decomposes and classifies the string into claims
//! 2. per structural claim, a second oracle call narrows the static
//!    candidate grounding set to the subset the claim actually implies
//! 3. levels come from the catalog precedence table
//! 4. records are assembled with explicit parent/child foreign keys
//!
//! Degradation is deliberate and loud: an unparseable classification becomes
//! an `UNMAPPED` record, and a failed grounding selection attaches the full
//! static candidate set. Coverage is never dropped silently.

use crate::record::AssertionSet;
use pqa_oracle::{OracleClient, OracleError, OracleReply, OracleRequest};
use pqa_taxonomy::{Catalog, DimensionId, GroundingCandidate, GroundingDimension};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// One atomic claim extracted by the classification call
#[derive(Debug, Clone, PartialEq)]
struct Claim {
    text: String,
    dimension: DimensionId,
}

/// One narrowed grounding selection
#[derive(Debug, Clone, PartialEq)]
struct Selection {
    dimension: GroundingDimension,
    statement: String,
}

/// Oracle-backed decomposer/classifier
pub struct AssertionClassifier {
    oracle: Arc<OracleClient>,
    catalog: Arc<Catalog>,
}

impl std::fmt::Debug for AssertionClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionClassifier").finish()
    }
}

impl AssertionClassifier {
    /// Create a classifier over an oracle client and catalog
    #[inline]
    #[must_use]
    pub fn new(oracle: Arc<OracleClient>, catalog: Arc<Catalog>) -> Self {
        Self { oracle, catalog }
    }

    /// Decompose one free-form assertion string into a validated set
    ///
    /// # Errors
    /// Only oracle failures propagate (authentication, exhausted rate-limit
    /// budget, upstream failure on the classification call). Parse failures
    /// degrade to sentinels instead.
    pub async fn decompose(
        &self,
        input: &str,
        context: Option<&str>,
    ) -> Result<AssertionSet, OracleError> {
        let reply = self.oracle.invoke(&classification_request(input, context)).await?;

        let claims = match parse_claims(&reply) {
            Some(claims) if !claims.is_empty() => claims,
            _ => {
                tracing::warn!("classification reply unparseable, degrading to UNMAPPED");
                vec![Claim {
                    text: input.to_string(),
                    dimension: DimensionId::Unmapped,
                }]
            }
        };
        tracing::debug!(claims = claims.len(), "input decomposed");

        let mut set = AssertionSet::new();
        for claim in claims {
            let parent = set.insert_primary(&self.catalog, claim.dimension, &claim.text, input);

            let DimensionId::Structural(structural) = claim.dimension else {
                continue;
            };
            let candidates = self.catalog.candidates_for(structural);
            if candidates.is_empty() {
                continue;
            }

            let selections = self.select_grounding(&claim.text, candidates).await?;
            match selections {
                Some(selected) => {
                    for selection in selected {
                        if let Err(err) = set.insert_grounding(
                            &self.catalog,
                            parent,
                            selection.dimension,
                            &selection.statement,
                            input,
                        ) {
                            tracing::warn!(%err, "grounding selection outside candidate set dropped");
                        }
                    }
                }
                None => {
                    tracing::warn!(
                        dimension = structural.id(),
                        "grounding selection failed, attaching full candidate set"
                    );
                    for candidate in candidates {
                        if let Err(err) = set.insert_grounding(
                            &self.catalog,
                            parent,
                            candidate.dimension,
                            fallback_statement(&claim.text, candidate),
                            input,
                        ) {
                            tracing::warn!(%err, "static candidate rejected");
                        }
                    }
                }
            }
        }

        Ok(set)
    }

    /// Run the relevance-selection call for one structural claim
    ///
    /// Returns `None` when the reply is unusable and the caller should fall
    /// back to the full candidate set. Fatal oracle errors propagate.
    async fn select_grounding(
        &self,
        claim_text: &str,
        candidates: &[GroundingCandidate],
    ) -> Result<Option<Vec<Selection>>, OracleError> {
        match self.oracle.invoke(&selection_request(claim_text, candidates)).await {
            Ok(reply) => Ok(parse_selection(&reply, candidates)),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                tracing::warn!(%err, "grounding selection call failed");
                Ok(None)
            }
        }
    }
}

/// Build the classification request
fn classification_request(input: &str, context: Option<&str>) -> OracleRequest {
    let mut payload = String::from(
        "Decompose the assertion below into atomic claims. Classify each claim \
         into exactly one dimension ID from the catalog. Reply with JSON: \
         {\"claims\": [{\"text\": ..., \"dimension\": ...}]}.\n\nCatalog:\n",
    );
    for dim in pqa_taxonomy::StructuralDimension::ALL {
        payload.push_str(&format!("  {} - {}\n", dim.id(), dim.name()));
    }
    for dim in GroundingDimension::ALL {
        payload.push_str(&format!("  {} - {}\n", dim.id(), dim.name()));
    }
    if let Some(context) = context {
        payload.push_str(&format!("\nContext:\n{context}\n"));
    }
    payload.push_str(&format!("\nAssertion:\n{input}\n"));

    OracleRequest::new(payload).with_temperature(0.0)
}

/// Build the grounding relevance-selection request
fn selection_request(claim_text: &str, candidates: &[GroundingCandidate]) -> OracleRequest {
    let mut payload = String::from(
        "From the candidate grounding checks below, select only those the \
         claim actually implies. Reply with JSON: {\"selections\": \
         [{\"dimension\": ..., \"statement\": ..., \"rationale\": ...}]}.\n\nCandidates:\n",
    );
    for candidate in candidates {
        payload.push_str(&format!(
            "  {} - {}: {}\n",
            candidate.dimension.id(),
            candidate.dimension.name(),
            candidate.rationale
        ));
    }
    payload.push_str(&format!("\nClaim:\n{claim_text}\n"));

    OracleRequest::new(payload).with_temperature(0.0)
}

/// Statement used when selection falls back to the static candidate set
fn fallback_statement(claim_text: &str, candidate: &GroundingCandidate) -> String {
    format!(
        "Values implicated by '{claim_text}' must be grounded: {}",
        candidate.rationale
    )
}

/// Parse the classification reply into claims
///
/// Pure function of the reply: identical replies yield identical claims.
/// Accepts `{"claims": [...]}` or a bare array. A claim with a missing or
/// unknown dimension degrades to `UNMAPPED` individually.
fn parse_claims(reply: &OracleReply) -> Option<Vec<Claim>> {
    let value = reply.as_structured()?;
    let items = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map.get("claims")?.as_array()?.as_slice(),
        _ => return None,
    };

    let mut claims = Vec::with_capacity(items.len());
    for item in items {
        let text = item.get("text")?.as_str()?.trim();
        if text.is_empty() {
            continue;
        }
        let dimension = item
            .get("dimension")
            .and_then(Value::as_str)
            .and_then(|s| DimensionId::from_str(s).ok())
            .unwrap_or(DimensionId::Unmapped);
        claims.push(Claim {
            text: text.to_string(),
            dimension,
        });
    }
    Some(claims)
}

/// Parse the selection reply, keeping only catalog candidates
///
/// Selections naming dimensions outside the candidate set are discarded:
/// the classifier narrows candidates, it never invents them.
fn parse_selection(
    reply: &OracleReply,
    candidates: &[GroundingCandidate],
) -> Option<Vec<Selection>> {
    let value = reply.as_structured()?;
    let items = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map.get("selections")?.as_array()?.as_slice(),
        _ => return None,
    };

    let mut selections = Vec::new();
    for item in items {
        let Some(dimension) = item
            .get("dimension")
            .and_then(Value::as_str)
            .and_then(|s| GroundingDimension::from_str(s).ok())
        else {
            continue;
        };
        if !candidates.iter().any(|c| c.dimension == dimension) {
            continue;
        }
        let statement = item
            .get("statement")
            .and_then(Value::as_str)
            .unwrap_or(dimension.name())
            .to_string();
        selections.push(Selection {
            dimension,
            statement,
        });
    }
    Some(selections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqa_taxonomy::{Layer, StructuralDimension};
    use pqa_test_utils::{scripted_client, ScriptedOracle};
    use serde_json::json;

    fn classifier(transport: Arc<ScriptedOracle>) -> AssertionClassifier {
        AssertionClassifier::new(
            Arc::new(scripted_client(transport)),
            Arc::new(Catalog::load().unwrap()),
        )
    }

    #[tokio::test]
    async fn compound_input_decomposes_into_linked_records() {
        let transport = ScriptedOracle::json_replies(vec![
            json!({"claims": [
                {"text": "the plan lists attendees", "dimension": "S2"},
                {"text": "the plan states its objective", "dimension": "S1"},
            ]}),
            // Selection for S2 only; S1 has no candidates
            json!({"selections": [
                {"dimension": "G1", "statement": "attendees must exist in the scenario",
                 "rationale": "names come from the roster"},
            ]}),
        ]);
        let set = classifier(transport.clone())
            .decompose("plan lists attendees and states its objective", None)
            .await
            .unwrap();

        assert_eq!(set.structural().count(), 2);
        assert_eq!(set.grounding().count(), 1);
        let child = set.grounding().next().unwrap();
        assert_eq!(
            child.dimension,
            DimensionId::Grounding(GroundingDimension::AttendeeGrounding)
        );
        assert!(child.parent_id.is_some());
        // One classification call + one selection call
        assert_eq!(transport.recorded().await.len(), 2);
    }

    #[tokio::test]
    async fn unparseable_classification_degrades_to_unmapped() {
        let transport = ScriptedOracle::replies(vec!["no structure here".to_string()]);
        let set = classifier(transport)
            .decompose("some assertion", None)
            .await
            .unwrap();

        assert_eq!(set.len(), 1);
        let record = set.records().first().unwrap();
        assert!(record.dimension.is_unmapped());
        assert_eq!(record.original_text, "some assertion");
    }

    #[tokio::test]
    async fn selection_narrows_to_subset_of_candidates() {
        let transport = ScriptedOracle::json_replies(vec![
            json!({"claims": [{"text": "owners are assigned", "dimension": "S5"}]}),
            // Reply names G1 (a candidate) and G3 (not a candidate for S5)
            json!({"selections": [
                {"dimension": "G1", "statement": "owners from roster", "rationale": "r"},
                {"dimension": "G3", "statement": "artifacts exist", "rationale": "r"},
            ]}),
        ]);
        let set = classifier(transport).decompose("owners", None).await.unwrap();

        let children: Vec<_> = set.grounding().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(
            children[0].dimension,
            DimensionId::Grounding(GroundingDimension::AttendeeGrounding)
        );
    }

    #[tokio::test]
    async fn failed_selection_attaches_full_candidate_set() {
        let transport = ScriptedOracle::json_replies(vec![
            json!({"claims": [{"text": "attendees listed", "dimension": "S2"}]}),
            json!("not a selection shape"),
        ]);
        let set = classifier(transport).decompose("attendees", None).await.unwrap();

        // S2 has two static candidates: G1 and G5
        let children: Vec<_> = set.grounding().map(|r| r.dimension.id()).collect();
        assert_eq!(children, vec!["G1", "G5"]);
    }

    #[tokio::test]
    async fn empty_candidate_set_skips_selection_call() {
        let transport = ScriptedOracle::json_replies(vec![
            json!({"claims": [{"text": "objective is stated", "dimension": "S1"}]}),
        ]);
        let set = classifier(transport.clone()).decompose("objective", None).await.unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(transport.recorded().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_dimension_in_claim_degrades_individually() {
        let transport = ScriptedOracle::json_replies(vec![
            json!({"claims": [
                {"text": "valid", "dimension": "S1"},
                {"text": "bogus", "dimension": "S42"},
            ]}),
        ]);
        let set = classifier(transport).decompose("mixed", None).await.unwrap();

        let dims: Vec<_> = set.iter().map(|r| r.dimension.id()).collect();
        assert_eq!(dims, vec!["S1", "UNMAPPED"]);
    }

    #[tokio::test]
    async fn classification_is_pure_given_identical_replies() {
        let script = || {
            ScriptedOracle::json_replies(vec![
                json!({"claims": [{"text": "schedule is given", "dimension": "S3"}]}),
                json!({"selections": [
                    {"dimension": "G2", "statement": "date matches", "rationale": "r"},
                ]}),
            ])
        };
        let first = classifier(script()).decompose("schedule", None).await.unwrap();
        let second = classifier(script()).decompose("schedule", None).await.unwrap();

        let shape = |set: &AssertionSet| {
            set.iter()
                .map(|r| {
                    (
                        r.dimension.id().to_string(),
                        r.layer == Layer::Grounding,
                        r.text.clone(),
                        r.parent_id.is_some(),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first), shape(&second));
    }

    #[tokio::test]
    async fn grounding_children_stay_within_catalog_candidates() {
        let transport = ScriptedOracle::json_replies(vec![
            json!({"claims": [{"text": "attendees listed", "dimension": "S2"}]}),
            json!({"selections": [
                {"dimension": "G5", "statement": "organizer matches", "rationale": "r"},
            ]}),
        ]);
        let set = classifier(transport).decompose("attendees", None).await.unwrap();
        let catalog = Catalog::load().unwrap();

        for parent in set.structural() {
            let DimensionId::Structural(structural) = parent.dimension else {
                continue;
            };
            for child in set.children_of(parent.id) {
                let DimensionId::Grounding(grounding) = child.dimension else {
                    panic!("child must be grounding");
                };
                assert!(catalog
                    .candidates_for(structural)
                    .iter()
                    .any(|c| c.dimension == grounding));
            }
        }
    }

    #[test]
    fn parse_claims_accepts_bare_array() {
        let reply = OracleReply::from_text(
            &json!([{"text": "a", "dimension": "S1"}]).to_string(),
        );
        let claims = parse_claims(&reply).unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(
            claims[0].dimension,
            DimensionId::Structural(StructuralDimension::ObjectiveStated)
        );
    }
}
