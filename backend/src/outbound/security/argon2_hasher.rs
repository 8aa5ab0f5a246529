//! Argon2id implementation of the [`PasswordHasher`] port.
//!
//! Hashing is CPU bound, so each call runs on Tokio's blocking pool through
//! [`TraceId::spawn_blocking`] and keeps the request's trace id in scope.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{
    Error as PhcError, PasswordHash as PhcHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::domain::{PasswordHash, TraceId};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Settings {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Settings {
    /// OWASP's recommended minimum for Argon2id: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Argon2id hasher producing PHC strings.
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
    decoy: PasswordHash,
}

fn hasher_error(error: impl std::fmt::Display) -> PasswordHasherError {
    PasswordHasherError::hash(error.to_string())
}

fn argon2(params: Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

fn hash_with(params: Params, password: &[u8]) -> Result<PasswordHash, PasswordHasherError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = argon2(params)
        .hash_password(password, &salt)
        .map_err(hasher_error)?
        .to_string();
    PasswordHash::new(phc).map_err(hasher_error)
}

fn verify_with(params: Params, password: &[u8], hash: &str) -> Result<bool, PasswordHasherError> {
    let parsed = PhcHash::new(hash).map_err(hasher_error)?;
    match argon2(params).verify_password(password, &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(other) => Err(hasher_error(other)),
    }
}

impl Argon2PasswordHasher {
    /// Build a hasher and precompute its decoy hash.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordHasherError::Hash`] when the parameters are out of
    /// range for Argon2.
    pub fn new(settings: Argon2Settings) -> Result<Self, PasswordHasherError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(hasher_error)?;
        let mut secret = Zeroizing::new([0_u8; 32]);
        OsRng.fill_bytes(&mut secret[..]);
        let decoy = hash_with(params.clone(), &secret[..])?;
        Ok(Self { params, decoy })
    }
}

async fn run_blocking<T>(
    work: impl FnOnce() -> Result<T, PasswordHasherError> + Send + 'static,
) -> Result<T, PasswordHasherError>
where
    T: Send + 'static,
{
    TraceId::spawn_blocking(work).await.map_err(hasher_error)?
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        let params = self.params.clone();
        let password = Zeroizing::new(password.to_owned());
        run_blocking(move || hash_with(params, password.as_bytes())).await
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let params = self.params.clone();
        let password = Zeroizing::new(password.to_owned());
        let hash = hash.as_str().to_owned();
        run_blocking(move || verify_with(params, password.as_bytes(), &hash)).await
    }

    fn decoy(&self) -> PasswordHash {
        self.decoy.clone()
    }
}
