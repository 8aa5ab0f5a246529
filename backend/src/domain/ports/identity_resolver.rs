//! Driving port turning a session user id into a caller [`Identity`].

use async_trait::async_trait;

use crate::domain::{Error, Identity, UserId};

/// Resolve the identity of the caller for one request.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Load role and active flag for `user_id`.
    ///
    /// Unknown and inactive accounts fail with `unauthorized`.
    async fn resolve(&self, user_id: &UserId) -> Result<Identity, Error>;
}
