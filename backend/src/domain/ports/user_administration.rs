//! Driving port for the admin account surface.
//!
//! Every call is authorized with the policy's `ManageUsers` rule, so only
//! admins get through and nobody may deactivate or delete their own account.

use async_trait::async_trait;

use crate::domain::{DisplayName, EmailAddress, Error, Identity, NewPassword, Role, User, UserId};

/// Validated payload for an admin-created account.
#[derive(Debug, Clone)]
pub struct NewUserRequest {
    pub email: EmailAddress,
    pub password: NewPassword,
    pub display_name: DisplayName,
    pub role: Role,
}

/// Partial account edit.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub display_name: Option<DisplayName>,
    pub email: Option<EmailAddress>,
    pub role: Option<Role>,
}

impl UserUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none() && self.role.is_none()
    }
}

#[async_trait]
pub trait UserAdministration: Send + Sync {
    async fn list_users(&self, identity: &Identity) -> Result<Vec<User>, Error>;

    async fn create_user(&self, identity: &Identity, request: NewUserRequest)
    -> Result<User, Error>;

    /// Demoting a technician who still has assigned tickets fails with
    /// `invalid_operation`.
    async fn update_user(
        &self,
        identity: &Identity,
        user_id: &UserId,
        update: UserUpdate,
    ) -> Result<User, Error>;

    async fn set_active(
        &self,
        identity: &Identity,
        user_id: &UserId,
        active: bool,
    ) -> Result<User, Error>;

    /// Deleting an account still referenced by tickets or comments fails
    /// with `invalid_operation`.
    async fn delete_user(&self, identity: &Identity, user_id: &UserId) -> Result<(), Error>;
}
