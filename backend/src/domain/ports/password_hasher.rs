//! Port for password hashing.
//!
//! Hashes are PHC strings, so the algorithm and its parameters travel with
//! each stored hash.

use async_trait::async_trait;

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHasherError {
        /// Hashing failed or the stored hash could not be parsed.
        Hash { message: String } => "password hashing failed: {message}",
    }
}

/// Derive and check password hashes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plain-text password with a fresh salt.
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError>;

    /// Check a plain-text password against a stored hash.
    async fn verify(&self, password: &str, hash: &PasswordHash)
    -> Result<bool, PasswordHasherError>;

    /// A valid hash of an unguessable secret.
    ///
    /// Login verifies against it when the email is unknown so both paths do
    /// the same amount of work.
    fn decoy(&self) -> PasswordHash;
}
