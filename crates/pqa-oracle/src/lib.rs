//! PQA Oracle - client for the external semantic oracle
//!
//! Every generative or judgment step in the pipeline (classification,
//! scenario synthesis, plan synthesis, evaluation) passes through this
//! client. It owns:
//! - the credential cache and the identity-provider seam
//! - retry/backoff policy for rate limits and timeouts
//! - the mandatory inter-call throttle
//! - reply-envelope classification (structured-or-raw)
//!
//! It performs no semantic interpretation of replies.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod credentials;
pub mod error;
pub mod reply;

pub use client::{NoopTransport, OracleClient, OracleConfig, OracleRequest, OracleTransport, RetryPolicy};
pub use credentials::{CredentialProvider, EnvCredentials};
pub use error::{OracleError, TransportError};
pub use reply::OracleReply;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
