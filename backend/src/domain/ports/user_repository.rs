//! Port abstraction for persisting user accounts.

use async_trait::async_trait;

use crate::domain::{EmailAddress, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised when persisting or loading users.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses this email.
        DuplicateEmail { email: String } => "email already registered: {email}",
        /// The account is still referenced by tickets or comments.
        InUse { user_id: String } => "user {user_id} is still referenced",
        /// A technician with assigned tickets cannot change role.
        StillAssigned { user_id: String } => "user {user_id} still has assigned tickets",
    }
}

/// Storage for user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(&self, email: &EmailAddress)
    -> Result<Option<User>, UserRepositoryError>;

    /// All accounts ordered by creation time, oldest first.
    async fn list(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Insert a new account.
    ///
    /// Fails with [`UserRepositoryError::DuplicateEmail`] when the email is taken.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Overwrite an existing account. Returns `false` when it does not exist.
    ///
    /// Fails with [`UserRepositoryError::StillAssigned`] when a stored
    /// `tecnico` would take another role while tickets are assigned to them.
    /// The count and the write happen in one atomic step.
    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError>;

    /// Remove an account. Returns `false` when it does not exist.
    ///
    /// Fails with [`UserRepositoryError::InUse`] when tickets or comments
    /// still reference the account.
    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError>;
}
