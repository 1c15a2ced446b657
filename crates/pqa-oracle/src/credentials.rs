//! Credential acquisition
//!
//! The identity-provider boundary is abstracted behind a trait so the client
//! never owns global mutable credential state. Acquisition may block on an
//! interactive step; the client tolerates a slow first call.

use crate::error::OracleError;
use async_trait::async_trait;

/// Identity-provider boundary: `acquire_credential() -> token`
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a bearer credential
    ///
    /// # Errors
    /// `OracleError::Authentication` if a credential cannot be obtained.
    async fn acquire_credential(&self) -> Result<String, OracleError>;
}

/// Reads the credential from an environment variable
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    /// Provider reading from the given env var
    #[inline]
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new("PQA_ORACLE_TOKEN")
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn acquire_credential(&self) -> Result<String, OracleError> {
        std::env::var(&self.var)
            .map_err(|_| OracleError::Authentication(format!("missing {}", self.var)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_env_var_is_authentication_error() {
        let provider = EnvCredentials::new("PQA_TEST_TOKEN_THAT_DOES_NOT_EXIST");
        let err = provider.acquire_credential().await.unwrap_err();
        assert!(matches!(err, OracleError::Authentication(_)));
    }
}
