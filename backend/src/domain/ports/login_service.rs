//! Driving port for password login.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, UserId};

/// Checks credentials against stored accounts.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    ///
    /// Unknown email, wrong password and inactive account all fail with the
    /// same `unauthorized` error.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}
