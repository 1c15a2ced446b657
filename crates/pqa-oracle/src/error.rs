//! Error types for the oracle client
//!
//! The taxonomy mirrors the propagation policy:
//! - `Authentication` is fatal for the whole run
//! - `RateLimited` is retried internally and escalates only after the retry
//!   budget is exhausted
//! - `Upstream` is a per-item failure and never aborts a batch
//! - `MalformedReply` is degraded to a sentinel by callers, never raised
//!   past the item level

/// Raw transport failure, before retry policy is applied
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Service signalled a rate limit
    #[error("rate limit signalled by upstream")]
    RateLimited,

    /// Request timed out in transit
    #[error("transport timeout")]
    Timeout,

    /// Non-success response other than a rate limit
    #[error("upstream returned {status}: {message}")]
    Upstream {
        /// HTTP-style status code
        status: u16,
        /// Upstream error body or reason
        message: String,
    },

    /// Connection-level failure
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Oracle client errors, after retry policy
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// Credentials could not be obtained (fatal for the run)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Retry budget exhausted on rate limiting
    #[error("rate limited after {attempts} attempts")]
    RateLimited {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Non-retryable upstream failure (per-item)
    #[error("upstream failure ({status}): {message}")]
    Upstream {
        /// HTTP-style status code
        status: u16,
        /// Upstream error body or reason
        message: String,
    },

    /// Connection-level failure after retries
    #[error("transport failure: {0}")]
    Transport(String),

    /// Reply could not be interpreted in the expected shape
    #[error("malformed oracle reply: {0}")]
    MalformedReply(String),
}

impl OracleError {
    /// True if this error must abort the entire run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::RateLimited { .. })
    }

    /// True if this error is recorded per item and the batch continues
    #[inline]
    #[must_use]
    pub fn is_item_failure(&self) -> bool {
        !self.is_fatal()
    }
}
