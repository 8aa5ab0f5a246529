//! Driving port for self-service sign-up.

use async_trait::async_trait;

use crate::domain::{DisplayName, EmailAddress, Error, NewPassword, User};

/// Validated sign-up payload.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub email: EmailAddress,
    pub password: NewPassword,
    pub display_name: DisplayName,
}

#[async_trait]
pub trait UserRegistration: Send + Sync {
    /// Create an active `usuario` account.
    ///
    /// A taken email fails with `invalid_operation`.
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error>;
}
