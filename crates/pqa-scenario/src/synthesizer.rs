//! Scenario and plan synthesizers
//!
//! Both are thin, single-call users of the oracle client:
//! - [`ScenarioSynthesizer`] produces the ground-truth record, falling back
//!   to a fixed minimal scenario when the reply is unusable
//! - [`PlanSynthesizer`] produces the artifact under test, with tier-specific
//!   defect-injection directives so the corpus spans known pass/fail
//!   combinations

use crate::plan::{DeliberateIssue, IssueKind, Plan, QualityTier};
use crate::scenario::Scenario;
use pqa_assertion::AssertionSet;
use pqa_oracle::{OracleClient, OracleError, OracleRequest};
use serde_json::Value;
use std::sync::Arc;

/// Oracle-backed ground-truth synthesizer
pub struct ScenarioSynthesizer {
    oracle: Arc<OracleClient>,
}

impl std::fmt::Debug for ScenarioSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioSynthesizer").finish()
    }
}

impl ScenarioSynthesizer {
    /// Create a synthesizer over an oracle client
    #[inline]
    #[must_use]
    pub fn new(oracle: Arc<OracleClient>) -> Self {
        Self { oracle }
    }

    /// Produce a scenario seeded by an assertion's text
    ///
    /// On an unusable reply, returns [`Scenario::minimal_default`] so
    /// downstream stages never receive a null scenario.
    ///
    /// # Errors
    /// Oracle failures only; parse failures fall back.
    pub async fn synthesize(&self, seed: &str) -> Result<Scenario, OracleError> {
        let request = OracleRequest::new(format!(
            "Invent a realistic meeting context for the assertion below. Reply \
             with JSON: {{\"attendees\": [...], \"organizer\": ..., \"date\": \
             \"YYYY-MM-DD\", \"time\": \"HH:MM\", \"timezone\": ..., \
             \"artifacts\": [...], \"topics\": [...], \"dependencies\": [...]}}.\n\n\
             Assertion:\n{seed}\n"
        ))
        .with_temperature(0.7);

        let reply = self.oracle.invoke(&request).await?;
        match reply.as_structured().cloned().map(serde_json::from_value::<Scenario>) {
            Some(Ok(scenario)) => {
                tracing::debug!(attendees = scenario.attendees.len(), "scenario synthesized");
                Ok(scenario)
            }
            _ => {
                tracing::warn!("scenario reply unusable, using minimal default");
                Ok(Scenario::minimal_default())
            }
        }
    }
}

/// Oracle-backed generator for plans at a target quality tier
///
/// For mid/low tiers this is a controlled-defect-injection generator, not a
/// quality-maximizing one: the directives tell the oracle what to get wrong.
pub struct PlanSynthesizer {
    oracle: Arc<OracleClient>,
}

impl std::fmt::Debug for PlanSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanSynthesizer").finish()
    }
}

impl PlanSynthesizer {
    /// Create a synthesizer over an oracle client
    #[inline]
    #[must_use]
    pub fn new(oracle: Arc<OracleClient>) -> Self {
        Self { oracle }
    }

    /// Produce a plan for the scenario at the target tier
    ///
    /// # Errors
    /// Oracle failures only.
    pub async fn synthesize(
        &self,
        scenario: &Scenario,
        intent: &str,
        assertions: &AssertionSet,
        tier: QualityTier,
    ) -> Result<Plan, OracleError> {
        let issues = injected_issues(tier, scenario);

        let mut payload = format!(
            "Write a meeting plan for the intent below, consistent with the \
             scenario, addressing the assertions.\n\nIntent:\n{intent}\n\n\
             Scenario:\n{}\n\nAssertions:\n",
            scenario.summary()
        );
        for record in assertions.structural() {
            payload.push_str(&format!("  - {}\n", record.text));
        }
        if !issues.is_empty() {
            payload.push_str("\nDeliberately violate the following (do not flag them):\n");
            for issue in &issues {
                payload.push_str(&format!("  - {}\n", issue.description));
            }
        }

        let request = OracleRequest::new(payload)
            .with_temperature(0.7)
            .with_max_output(4096);
        let reply = self.oracle.invoke(&request).await?;

        // A plan is a body of text; accept {"plan": ...}/{"text": ...} or raw.
        let text = match reply.as_structured() {
            Some(Value::Object(map)) => map
                .get("plan")
                .or_else(|| map.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| reply.display_text()),
            _ => reply.display_text(),
        };

        tracing::debug!(%tier, issues = issues.len(), "plan synthesized");
        Ok(Plan {
            text,
            quality_tier: tier,
            deliberate_issues: issues,
        })
    }
}

/// Fixed defect-injection table per tier
///
/// Descriptions reference concrete scenario values so the evaluator's
/// regression corpus knows exactly what should fail.
fn injected_issues(tier: QualityTier, scenario: &Scenario) -> Vec<DeliberateIssue> {
    match tier {
        QualityTier::Top => Vec::new(),
        QualityTier::Mid => vec![
            DeliberateIssue::new(
                IssueKind::StructuralOmission,
                "omit all references to supporting artifacts",
            ),
            DeliberateIssue::new(
                IssueKind::FabricatedName,
                "assign one task to 'Riley Fabricant', who is not an attendee",
            ),
        ],
        QualityTier::Low => vec![
            DeliberateIssue::new(
                IssueKind::StructuralOmission,
                "omit the agenda topics entirely",
            ),
            DeliberateIssue::new(
                IssueKind::FabricatedName,
                "assign one task to 'Riley Fabricant', who is not an attendee",
            ),
            DeliberateIssue::new(
                IssueKind::DateMismatch,
                format!(
                    "state the meeting date as one week after {} instead of the scenario date",
                    scenario.date
                ),
            ),
            DeliberateIssue::new(
                IssueKind::FabricatedArtifact,
                "cite a deck named 'final_v9.pptx' that the scenario does not contain",
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqa_test_utils::{sample_scenario_json, scripted_client, ScriptedOracle};
    use serde_json::json;

    #[tokio::test]
    async fn scenario_parses_structured_reply() {
        let transport = ScriptedOracle::json_replies(vec![sample_scenario_json()]);
        let synthesizer = ScenarioSynthesizer::new(Arc::new(scripted_client(transport)));

        let scenario = synthesizer.synthesize("attendees are listed").await.unwrap();
        assert_eq!(scenario.attendees, vec!["Ava Chen", "Ben Ortiz"]);
        assert_eq!(scenario.organizer, "Ava Chen");
    }

    #[tokio::test]
    async fn scenario_falls_back_on_raw_reply() {
        let transport = ScriptedOracle::replies(vec!["sorry, no json".to_string()]);
        let synthesizer = ScenarioSynthesizer::new(Arc::new(scripted_client(transport)));

        let scenario = synthesizer.synthesize("seed").await.unwrap();
        assert_eq!(scenario, Scenario::minimal_default());
    }

    #[tokio::test]
    async fn scenario_falls_back_on_wrong_shape() {
        let transport = ScriptedOracle::json_replies(vec![json!({"unexpected": true})]);
        let synthesizer = ScenarioSynthesizer::new(Arc::new(scripted_client(transport)));

        let scenario = synthesizer.synthesize("seed").await.unwrap();
        assert_eq!(scenario, Scenario::minimal_default());
    }

    #[tokio::test]
    async fn top_tier_plan_has_no_injected_issues() {
        let transport = ScriptedOracle::replies(vec!["a thorough plan".to_string()]);
        let synthesizer = PlanSynthesizer::new(Arc::new(scripted_client(transport.clone())));

        let plan = synthesizer
            .synthesize(
                &Scenario::minimal_default(),
                "plan the meeting",
                &AssertionSet::new(),
                QualityTier::Top,
            )
            .await
            .unwrap();

        assert_eq!(plan.text, "a thorough plan");
        assert!(plan.deliberate_issues.is_empty());
        let requests = transport.recorded().await;
        assert!(!requests[0].payload.contains("Deliberately violate"));
    }

    #[tokio::test]
    async fn low_tier_plan_carries_defect_directives() {
        let transport = ScriptedOracle::replies(vec!["a bad plan".to_string()]);
        let synthesizer = PlanSynthesizer::new(Arc::new(scripted_client(transport.clone())));

        let plan = synthesizer
            .synthesize(
                &Scenario::minimal_default(),
                "plan the meeting",
                &AssertionSet::new(),
                QualityTier::Low,
            )
            .await
            .unwrap();

        assert_eq!(plan.quality_tier, QualityTier::Low);
        assert!(plan.deliberate_issues.len() >= 3);
        assert!(plan
            .deliberate_issues
            .iter()
            .any(|i| i.kind == IssueKind::DateMismatch));

        let requests = transport.recorded().await;
        assert!(requests[0].payload.contains("Deliberately violate"));
        assert!(requests[0].payload.contains("Riley Fabricant"));
    }

    #[tokio::test]
    async fn structured_plan_reply_extracts_text() {
        let transport = ScriptedOracle::json_replies(vec![json!({"plan": "structured body"})]);
        let synthesizer = PlanSynthesizer::new(Arc::new(scripted_client(transport)));

        let plan = synthesizer
            .synthesize(
                &Scenario::minimal_default(),
                "intent",
                &AssertionSet::new(),
                QualityTier::Top,
            )
            .await
            .unwrap();
        assert_eq!(plan.text, "structured body");
    }
}
