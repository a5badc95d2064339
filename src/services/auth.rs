//! Credential verification — the boundary between the login route and
//! whatever knows who the operators are.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::config::OperatorCredential;
use crate::services::session::{Operator, bytes_to_hex};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credential backend unavailable: {0}")]
    Backend(String),
}

impl crate::frame::ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "E_AUTH_BACKEND",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `Ok(None)` for unknown users or wrong passwords.
    async fn verify(&self, username: &str, password: &str) -> Result<Option<Operator>, AuthError>;
}

/// Verifies against operator credentials loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialVerifier {
    credentials: Vec<OperatorCredential>,
}

impl StaticCredentialVerifier {
    #[must_use]
    pub fn new(credentials: Vec<OperatorCredential>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<Operator>, AuthError> {
        let digest = hash_password(password);
        let matched = self
            .credentials
            .iter()
            .find(|c| c.username == username && constant_time_eq(c.password_sha256.as_bytes(), digest.as_bytes()));
        Ok(matched.map(|c| Operator { username: c.username.clone() }))
    }
}

/// Hex sha256 of a password, the form operator credentials are configured in.
#[must_use]
pub fn hash_password(password: &str) -> String {
    bytes_to_hex(&Sha256::digest(password.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
