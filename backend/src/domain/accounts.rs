//! Account use-cases: login, identity resolution, sign-up and profile.
//!
//! Login failures are indistinguishable to the caller. Unknown email, wrong
//! password and inactive account all return the same `unauthorized` error
//! and all run a password verification.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    IdentityResolver, LoginService, PasswordHasher, RegistrationRequest, UserProfileQuery,
    UserRegistration, UserRepository,
};
use crate::domain::storage::{StorageDeadline, map_hasher_error, map_user_error};
use crate::domain::{
    DisplayName, EmailAddress, Error, Identity, LoginCredentials, NewPassword, Role, User, UserId,
};

/// Domain service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
    deadline: StorageDeadline,
}

impl<U, H> AccountService<U, H> {
    pub fn new(users: Arc<U>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
            deadline: StorageDeadline::default(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: StorageDeadline) -> Self {
        self.deadline = deadline;
        self
    }
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

impl<U, H> AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    /// Hash `password` and store a new active account.
    pub(crate) async fn create_account(
        &self,
        email: EmailAddress,
        password: &NewPassword,
        display_name: DisplayName,
        role: Role,
    ) -> Result<User, Error> {
        let hash = self
            .hasher
            .hash(password.expose())
            .await
            .map_err(map_hasher_error)?;
        let user = User::register(email, hash, display_name, role, self.clock.utc());
        self.deadline
            .run("insert_user", self.users.insert(&user), map_user_error)
            .await?;
        info!(user_id = %user.id(), role = %user.role(), "account created");
        Ok(user)
    }

    /// Create an admin account unless one already uses `email`.
    ///
    /// Returns the new account, or `None` when the email is taken.
    pub async fn ensure_admin(
        &self,
        email: EmailAddress,
        password: &NewPassword,
    ) -> Result<Option<User>, Error> {
        let existing = self
            .deadline
            .run("find_user", self.users.find_by_email(&email), map_user_error)
            .await?;
        if existing.is_some() {
            debug!(%email, "bootstrap admin already present");
            return Ok(None);
        }
        let display_name = DisplayName::new("Administrator").map_err(|err| {
            Error::internal(format!("bootstrap display name rejected: {err}"))
        })?;
        self.create_account(email, password, display_name, Role::Admin)
            .await
            .map(Some)
    }
}

#[async_trait]
impl<U, H> LoginService for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        // A malformed email cannot match any account; treat it as unknown.
        let user = match EmailAddress::new(credentials.email()) {
            Ok(email) => {
                self.deadline
                    .run("find_user", self.users.find_by_email(&email), map_user_error)
                    .await?
            }
            Err(_) => None,
        };

        let hash = user
            .as_ref()
            .map_or_else(|| self.hasher.decoy(), |found| found.password_hash().clone());
        let verified = self
            .hasher
            .verify(credentials.password(), &hash)
            .await
            .map_err(map_hasher_error)?;

        match user {
            Some(found) if verified && found.is_active() => {
                info!(user_id = %found.id(), "login succeeded");
                Ok(found.id().clone())
            }
            _ => {
                debug!("login rejected");
                Err(invalid_credentials())
            }
        }
    }
}

#[async_trait]
impl<U, H> IdentityResolver for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn resolve(&self, user_id: &UserId) -> Result<Identity, Error> {
        let user = self
            .deadline
            .run("find_user", self.users.find_by_id(user_id), map_user_error)
            .await?;
        match user {
            Some(found) if found.is_active() => Ok(Identity::from(&found)),
            Some(_) => {
                debug!(%user_id, "session belongs to an inactive account");
                Err(Error::unauthorized("account is inactive")
                    .with_details(json!({ "reason": "inactive_account" })))
            }
            None => Err(Error::unauthorized("login required")),
        }
    }
}

#[async_trait]
impl<U, H> UserRegistration for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error> {
        let RegistrationRequest {
            email,
            password,
            display_name,
        } = request;
        self.create_account(email, &password, display_name, Role::Usuario)
            .await
    }
}

#[async_trait]
impl<U, H> UserProfileQuery for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn fetch_profile(&self, identity: &Identity) -> Result<User, Error> {
        self.deadline
            .run(
                "find_user",
                self.users.find_by_id(identity.user_id()),
                map_user_error,
            )
            .await?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}
