//! Oracle client
//!
//! Wraps one synchronous external operation, `invoke(request) -> text`, with:
//! - credential caching for the lifetime of the client
//! - bounded retry on rate limits with linear backoff
//! - fixed short-delay retry on transport timeouts
//! - a mandatory inter-call throttle between consecutive invocations
//!
//! The client performs no semantic interpretation; it only classifies the
//! reply envelope as structured-or-raw.

use crate::credentials::CredentialProvider;
use crate::error::{OracleError, TransportError};
use crate::reply::OracleReply;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One request to the oracle service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    /// Instruction payload (prompt text)
    pub payload: String,
    /// Optional system framing
    pub system: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token budget
    pub max_output: u32,
}

impl OracleRequest {
    /// Request with default generation parameters
    #[inline]
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            system: None,
            temperature: 0.2,
            max_output: 2048,
        }
    }

    /// With system framing
    #[inline]
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// With sampling temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// With output budget
    #[inline]
    #[must_use]
    pub fn with_max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }
}

/// Transport boundary for the oracle service
///
/// The concrete wire protocol is external; the core only depends on this
/// seam.
#[async_trait]
pub trait OracleTransport: Send + Sync {
    /// Send one request with a bearer token, returning raw reply text
    async fn invoke(&self, request: &OracleRequest, token: &str)
        -> Result<String, TransportError>;
}

/// Default unconfigured transport
///
/// Real transports are plugged in by the embedding application.
#[derive(Debug, Default)]
pub struct NoopTransport;

#[async_trait]
impl OracleTransport for NoopTransport {
    async fn invoke(
        &self,
        _request: &OracleRequest,
        _token: &str,
    ) -> Result<String, TransportError> {
        Err(TransportError::Connection(
            "oracle transport not configured".to_string(),
        ))
    }
}

/// Retry and throttle policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retry budget for rate limits and timeouts
    pub max_retries: u32,
    /// Base delay; rate-limit attempt n waits `(n+1) * base_delay`
    pub base_delay: Duration,
    /// Fixed delay before retrying a timed-out call
    pub timeout_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_secs(2),
            timeout_delay: Duration::from_millis(500),
        }
    }
}

/// Oracle client configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Retry policy
    pub retry: RetryPolicy,
    /// Mandatory delay between consecutive invocations
    pub throttle: Duration,
}

impl OracleConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With inter-call throttle
    #[inline]
    #[must_use]
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Zero-delay configuration for tests
    #[inline]
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            retry: RetryPolicy {
                max_retries: 4,
                base_delay: Duration::ZERO,
                timeout_delay: Duration::ZERO,
            },
            throttle: Duration::ZERO,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            throttle: Duration::from_millis(750),
        }
    }
}

/// The oracle client
///
/// Single point through which every non-deterministic step passes.
pub struct OracleClient {
    transport: Arc<dyn OracleTransport>,
    credentials: Arc<dyn CredentialProvider>,
    config: OracleConfig,
    /// Write-once credential cache
    token: Mutex<Option<String>>,
    /// Whether at least one call has been issued (throttle gate)
    invoked: Mutex<bool>,
}

impl std::fmt::Debug for OracleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleClient")
            .field("config", &self.config)
            .finish()
    }
}

impl OracleClient {
    /// Create a client over a transport and credential provider
    #[must_use]
    pub fn new(
        transport: Arc<dyn OracleTransport>,
        credentials: Arc<dyn CredentialProvider>,
        config: OracleConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            config,
            token: Mutex::new(None),
            invoked: Mutex::new(false),
        }
    }

    /// Invoke the oracle once, with retries, returning the classified reply
    ///
    /// # Errors
    /// - `OracleError::Authentication` if no credential can be obtained
    /// - `OracleError::RateLimited` after the retry budget is exhausted
    /// - `OracleError::Upstream` for any other non-success response
    pub async fn invoke(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let token = self.cached_token().await?;
        self.throttle().await;

        let max = self.config.retry.max_retries;
        let mut attempt: u32 = 0;

        loop {
            match self.transport.invoke(request, &token).await {
                Ok(text) => {
                    tracing::debug!(bytes = text.len(), "oracle reply received");
                    return Ok(OracleReply::from_text(&text));
                }
                Err(TransportError::RateLimited) => {
                    if attempt >= max {
                        tracing::warn!(attempts = attempt + 1, "rate limit retry budget exhausted");
                        return Err(OracleError::RateLimited {
                            attempts: attempt + 1,
                        });
                    }
                    let wait = self.config.retry.base_delay * (attempt + 1);
                    tracing::debug!(attempt, wait_ms = wait.as_millis() as u64, "rate limited, backing off");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(TransportError::Timeout) => {
                    if attempt >= max {
                        return Err(OracleError::Transport(format!(
                            "timed out after {} attempts",
                            attempt + 1
                        )));
                    }
                    tracing::debug!(attempt, "transport timeout, retrying");
                    tokio::time::sleep(self.config.retry.timeout_delay).await;
                    attempt += 1;
                }
                Err(TransportError::Upstream { status, message }) => {
                    tracing::warn!(status, "upstream failure");
                    return Err(OracleError::Upstream { status, message });
                }
                Err(TransportError::Connection(message)) => {
                    return Err(OracleError::Transport(message));
                }
            }
        }
    }

    /// Cached credential, acquiring it on first use
    async fn cached_token(&self) -> Result<String, OracleError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.credentials.acquire_credential().await?;
        tracing::debug!("credential acquired and cached");
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Sleep the configured throttle before every call after the first
    async fn throttle(&self) {
        let mut guard = self.invoked.lock().await;
        if *guard {
            if !self.config.throttle.is_zero() {
                tokio::time::sleep(self.config.throttle).await;
            }
        } else {
            *guard = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedCredentials(&'static str);

    #[async_trait]
    impl CredentialProvider for FixedCredentials {
        async fn acquire_credential(&self) -> Result<String, OracleError> {
            Ok(self.0.to_string())
        }
    }

    struct CountingCredentials(AtomicU32);

    #[async_trait]
    impl CredentialProvider for CountingCredentials {
        async fn acquire_credential(&self) -> Result<String, OracleError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("token".to_string())
        }
    }

    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<String, TransportError>>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<String, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    #[async_trait]
    impl OracleTransport for ScriptedTransport {
        async fn invoke(
            &self,
            _request: &OracleRequest,
            _token: &str,
        ) -> Result<String, TransportError> {
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or(Err(TransportError::Connection("script exhausted".into())))
        }
    }

    fn client(replies: Vec<Result<String, TransportError>>) -> OracleClient {
        OracleClient::new(
            Arc::new(ScriptedTransport::new(replies)),
            Arc::new(FixedCredentials("t")),
            OracleConfig::immediate(),
        )
    }

    #[tokio::test]
    async fn success_returns_classified_reply() {
        let client = client(vec![Ok(r#"{"ok": true}"#.to_string())]);
        let reply = client.invoke(&OracleRequest::new("hi")).await.unwrap();
        assert!(reply.as_structured().is_some());
    }

    #[tokio::test]
    async fn rate_limit_is_retried_then_succeeds() {
        let client = client(vec![
            Err(TransportError::RateLimited),
            Err(TransportError::RateLimited),
            Ok("done".to_string()),
        ]);
        let reply = client.invoke(&OracleRequest::new("hi")).await.unwrap();
        assert!(matches!(reply, OracleReply::Raw(_)));
    }

    #[tokio::test]
    async fn rate_limit_budget_exhaustion_escalates() {
        let replies = (0..6)
            .map(|_| Err(TransportError::RateLimited))
            .collect::<Vec<_>>();
        let client = client(replies);
        let err = client.invoke(&OracleRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, OracleError::RateLimited { attempts: 5 }));
    }

    #[tokio::test]
    async fn timeout_is_retried() {
        let client = client(vec![Err(TransportError::Timeout), Ok("ok".to_string())]);
        assert!(client.invoke(&OracleRequest::new("hi")).await.is_ok());
    }

    #[tokio::test]
    async fn upstream_failure_is_not_retried() {
        let client = client(vec![
            Err(TransportError::Upstream {
                status: 500,
                message: "boom".into(),
            }),
            Ok("never reached".to_string()),
        ]);
        let err = client.invoke(&OracleRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, OracleError::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn credential_is_acquired_once() {
        let credentials = Arc::new(CountingCredentials(AtomicU32::new(0)));
        let client = OracleClient::new(
            Arc::new(ScriptedTransport::new(vec![
                Ok("a".to_string()),
                Ok("b".to_string()),
            ])),
            credentials.clone(),
            OracleConfig::immediate(),
        );

        client.invoke(&OracleRequest::new("one")).await.unwrap();
        client.invoke(&OracleRequest::new("two")).await.unwrap();
        assert_eq!(credentials.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn noop_transport_reports_unconfigured() {
        let client = OracleClient::new(
            Arc::new(NoopTransport),
            Arc::new(FixedCredentials("t")),
            OracleConfig::immediate(),
        );
        let err = client.invoke(&OracleRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, OracleError::Transport(_)));
    }
}
