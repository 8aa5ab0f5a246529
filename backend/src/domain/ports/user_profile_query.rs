//! Driving port for reading the caller's own account.

use async_trait::async_trait;

use crate::domain::{Error, Identity, User};

#[async_trait]
pub trait UserProfileQuery: Send + Sync {
    /// Fetch the account behind `identity`.
    async fn fetch_profile(&self, identity: &Identity) -> Result<User, Error>;
}
