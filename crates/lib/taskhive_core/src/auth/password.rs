//! Password hashing via bcrypt.

use thiserror::Error;

/// bcrypt cost factor.
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("bcrypt hash: {0}")]
    Hash(String),

    #[error("bcrypt verify: {0}")]
    Verify(String),
}

/// One-way, salted password hashing.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

/// bcrypt-backed [`CredentialHasher`].
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self { cost: BCRYPT_COST }
    }
}

impl BcryptHasher {
    /// Hasher with a custom cost (bcrypt accepts 4..=31).
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| HashError::Hash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        bcrypt::verify(plaintext, hash).map_err(|e| HashError::Verify(e.to_string()))
    }
}
