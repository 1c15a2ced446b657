//! Testing utilities for the PQA workspace
//!
//! Scripted oracle transports, fixed credentials, and fixture payloads.

#![allow(missing_docs)]

use async_trait::async_trait;
use pqa_oracle::{
    CredentialProvider, OracleClient, OracleConfig, OracleError, OracleRequest, OracleTransport,
    TransportError,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Credential provider that always yields the same token.
pub struct StaticCredentials(pub String);

impl StaticCredentials {
    pub fn token() -> Self {
        Self("test-token".to_string())
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn acquire_credential(&self) -> Result<String, OracleError> {
        Ok(self.0.clone())
    }
}

/// Credential provider that always fails, for fatal-path tests.
pub struct DeniedCredentials;

#[async_trait]
impl CredentialProvider for DeniedCredentials {
    async fn acquire_credential(&self) -> Result<String, OracleError> {
        Err(OracleError::Authentication("denied by test".to_string()))
    }
}

/// Transport that replays a fixed script of replies and records every
/// request it sees, in order.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, TransportError>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<String, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Script of successful text replies.
    pub fn replies(texts: Vec<String>) -> Arc<Self> {
        Self::new(texts.into_iter().map(Ok).collect())
    }

    /// Script of successful JSON replies.
    pub fn json_replies(values: Vec<Value>) -> Arc<Self> {
        Self::replies(values.into_iter().map(|v| v.to_string()).collect())
    }

    /// Requests recorded so far.
    pub async fn recorded(&self) -> Vec<OracleRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of scripted replies not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }
}

#[async_trait]
impl OracleTransport for ScriptedOracle {
    async fn invoke(
        &self,
        request: &OracleRequest,
        _token: &str,
    ) -> Result<String, TransportError> {
        self.requests.lock().await.push(request.clone());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(TransportError::Connection(
                "scripted oracle exhausted".to_string(),
            )))
    }
}

/// Client over a scripted transport with zero delays.
pub fn scripted_client(transport: Arc<ScriptedOracle>) -> OracleClient {
    OracleClient::new(
        transport,
        Arc::new(StaticCredentials::token()),
        OracleConfig::immediate(),
    )
}

/// Fixture scenario payload matching the `Scenario` wire shape.
pub fn sample_scenario_json() -> Value {
    json!({
        "attendees": ["Ava Chen", "Ben Ortiz"],
        "organizer": "Ava Chen",
        "date": "2025-03-15",
        "time": "10:00",
        "timezone": "UTC",
        "artifacts": ["x.pptx"],
        "topics": ["Q2 roadmap", "budget review"],
        "dependencies": ["design sign-off before build"]
    })
}

/// Classification reply assigning one claim to the given dimension ID.
pub fn classification_reply(text: &str, dimension: &str) -> Value {
    json!({ "claims": [{ "text": text, "dimension": dimension }] })
}

/// Grounding-selection reply picking the given dimension IDs.
pub fn selection_reply(dimensions: &[&str]) -> Value {
    let selections: Vec<Value> = dimensions
        .iter()
        .map(|d| {
            json!({
                "dimension": d,
                "statement": format!("values for {d} must match the scenario"),
                "rationale": format!("{d} applies to this claim")
            })
        })
        .collect();
    json!({ "selections": selections })
}

/// Well-shaped evaluation reply.
pub fn evaluation_reply(
    check: &str,
    passed: bool,
    evidence: &[&str],
    values_found: &[&str],
    mismatches: &[&str],
) -> Value {
    json!({
        "check": check,
        "passed": passed,
        "explanation": "scripted evaluation",
        "evidence": evidence
            .iter()
            .map(|e| json!({ "text": e, "confidence": 0.9 }))
            .collect::<Vec<_>>(),
        "values_found": values_found,
        "mismatches": mismatches,
    })
}
