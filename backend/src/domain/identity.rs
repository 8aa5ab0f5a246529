//! Request-scoped caller identity.

use super::{Role, User, UserId};

/// Who is calling: resolved once per request from the session user id.
///
/// Immutable for the duration of the request. Role and active flag are read
/// from storage at resolution time, so an admin demotion or deactivation
/// applies on the caller's next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    role: Role,
    active: bool,
}

impl Identity {
    #[must_use]
    pub const fn new(user_id: UserId, role: Role, active: bool) -> Self {
        Self {
            user_id,
            role,
            active,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Admins and technicians.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::new(user.id().clone(), user.role(), user.is_active())
    }
}
