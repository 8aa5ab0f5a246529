//! Admin account management.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::accounts::AccountService;
use crate::domain::policy::{Action, UserChange, enforce};
use crate::domain::ports::{
    NewUserRequest, PasswordHasher, TicketRepository, UserAdministration, UserRepository,
    UserUpdate,
};
use crate::domain::storage::{StorageDeadline, map_ticket_error, map_user_error};
use crate::domain::{Error, Identity, Role, User, UserId};

/// Domain service implementing [`UserAdministration`].
#[derive(Clone)]
pub struct UserAdminService<U, T, H> {
    users: Arc<U>,
    tickets: Arc<T>,
    accounts: AccountService<U, H>,
    clock: Arc<dyn Clock>,
    deadline: StorageDeadline,
}

impl<U, T, H> UserAdminService<U, T, H> {
    pub fn new(users: Arc<U>, tickets: Arc<T>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: AccountService::new(Arc::clone(&users), hasher, Arc::clone(&clock)),
            users,
            tickets,
            clock,
            deadline: StorageDeadline::default(),
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: StorageDeadline) -> Self {
        self.accounts = self.accounts.with_deadline(deadline);
        self.deadline = deadline;
        self
    }
}

fn user_not_found(user_id: &UserId) -> Error {
    Error::not_found("user not found").with_details(json!({
        "userId": user_id.to_string(),
        "code": "user_not_found",
    }))
}

impl<U, T, H> UserAdminService<U, T, H>
where
    U: UserRepository,
    T: TicketRepository,
    H: PasswordHasher,
{
    async fn load(&self, user_id: &UserId) -> Result<User, Error> {
        self.deadline
            .run("find_user", self.users.find_by_id(user_id), map_user_error)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    async fn store(&self, user: &User) -> Result<(), Error> {
        let updated = self
            .deadline
            .run("update_user", self.users.update(user), map_user_error)
            .await?;
        if updated {
            Ok(())
        } else {
            Err(user_not_found(user.id()))
        }
    }

    /// A technician with assigned tickets must keep the role.
    async fn ensure_can_leave_technician_role(&self, user: &User) -> Result<(), Error> {
        let assigned = self
            .deadline
            .run(
                "count_assigned",
                self.tickets.count_assigned_to(user.id()),
                map_ticket_error,
            )
            .await?;
        if assigned == 0 {
            return Ok(());
        }
        Err(
            Error::invalid_operation("technician still has assigned tickets").with_details(json!({
                "userId": user.id().to_string(),
                "assignedTickets": assigned,
                "code": "technician_has_assignments",
            })),
        )
    }
}

#[async_trait]
impl<U, T, H> UserAdministration for UserAdminService<U, T, H>
where
    U: UserRepository,
    T: TicketRepository,
    H: PasswordHasher,
{
    async fn list_users(&self, identity: &Identity) -> Result<Vec<User>, Error> {
        enforce(
            identity,
            Action::ManageUsers {
                target: None,
                change: UserChange::List,
            },
        )?;
        self.deadline
            .run("list_users", self.users.list(), map_user_error)
            .await
    }

    async fn create_user(
        &self,
        identity: &Identity,
        request: NewUserRequest,
    ) -> Result<User, Error> {
        enforce(
            identity,
            Action::ManageUsers {
                target: None,
                change: UserChange::Create,
            },
        )?;
        let NewUserRequest {
            email,
            password,
            display_name,
            role,
        } = request;
        self.accounts
            .create_account(email, &password, display_name, role)
            .await
    }

    async fn update_user(
        &self,
        identity: &Identity,
        user_id: &UserId,
        update: UserUpdate,
    ) -> Result<User, Error> {
        enforce(
            identity,
            Action::ManageUsers {
                target: Some(user_id),
                change: UserChange::Update,
            },
        )?;
        if update.is_empty() {
            return Err(Error::invalid_request("update must change at least one field")
                .with_details(json!({ "code": "empty_update" })));
        }
        let mut user = self.load(user_id).await?;
        let now = self.clock.utc();
        let UserUpdate {
            display_name,
            email,
            role,
        } = update;

        if let Some(role) = role.filter(|role| *role != user.role()) {
            if user.role() == Role::Tecnico {
                self.ensure_can_leave_technician_role(&user).await?;
            }
            user.change_role(role, now);
        }
        if let Some(display_name) = display_name {
            user.rename(display_name, now);
        }
        if let Some(email) = email {
            user.change_email(email, now);
        }

        self.store(&user).await?;
        info!(user_id = %user_id, actor = %identity.user_id(), "account updated");
        Ok(user)
    }

    async fn set_active(
        &self,
        identity: &Identity,
        user_id: &UserId,
        active: bool,
    ) -> Result<User, Error> {
        let change = if active {
            UserChange::Activate
        } else {
            UserChange::Deactivate
        };
        enforce(
            identity,
            Action::ManageUsers {
                target: Some(user_id),
                change,
            },
        )?;
        let mut user = self.load(user_id).await?;
        if user.is_active() == active {
            return Ok(user);
        }
        user.set_active(active, self.clock.utc());
        self.store(&user).await?;
        info!(user_id = %user_id, active, actor = %identity.user_id(), "account activation changed");
        Ok(user)
    }

    async fn delete_user(&self, identity: &Identity, user_id: &UserId) -> Result<(), Error> {
        enforce(
            identity,
            Action::ManageUsers {
                target: Some(user_id),
                change: UserChange::Delete,
            },
        )?;
        let removed = self
            .deadline
            .run("delete_user", self.users.delete(user_id), map_user_error)
            .await?;
        if !removed {
            return Err(user_not_found(user_id));
        }
        info!(user_id = %user_id, actor = %identity.user_id(), "account deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "user_admin_service_tests.rs"]
mod tests;
