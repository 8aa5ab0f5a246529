//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Updates lock the account row with `SELECT ... FOR UPDATE` before counting
//! its assigned tickets, so a technician cannot be demoted while a ticket
//! save is naming them as assignee.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{EmailAddress, Role, User, UserId};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, map_pool_error_message,
};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{tickets, users};

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(map_pool_error_message(error))
}

/// Map a Diesel failure. `user` names the account for write-side violations.
fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
    user: Option<&User>,
) -> UserRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::UniqueViolation { .. } => match user {
            Some(user) => UserRepositoryError::duplicate_email(user.email().as_ref()),
            None => UserRepositoryError::query("unique constraint violated"),
        },
        DieselFailure::ForeignKeyViolation { .. } => match user {
            Some(user) => UserRepositoryError::in_use(user.id().as_ref()),
            None => UserRepositoryError::query("foreign key violation"),
        },
        DieselFailure::Connection { message } => UserRepositoryError::connection(message),
        DieselFailure::Query { message } => UserRepositoryError::query(message),
    }
}

fn row_to_user(row: UserRow) -> Result<User, String> {
    User::try_from(row)
}

fn leaves_technician_role(stored_role: &str, user: &User) -> bool {
    stored_role == Role::Tecnico.as_str() && user.role() != Role::Tecnico
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find_user", None))?;
        row.map(row_to_user)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find_user_by_email", None))?;
        row.map(row_to_user)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order_by((users::created_at.asc(), users::id.asc()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list_users", None))?;
        collect_rows(rows.into_iter().map(row_to_user), UserRepositoryError::query)
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(NewUserRow::from(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, "insert_user", Some(user)))
    }

    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_id = *user.id().as_uuid();
        let changeset = UserChangeset::from(user);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let stored_role: Option<String> = users::table
                    .filter(users::id.eq(user_id))
                    .select(users::role)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(stored_role) = stored_role else {
                    return Ok(Ok(false));
                };

                if leaves_technician_role(&stored_role, user) {
                    let assigned: i64 = tickets::table
                        .filter(tickets::assigned_to.eq(user_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if assigned > 0 {
                        return Ok(Err(UserRepositoryError::still_assigned(
                            user.id().as_ref(),
                        )));
                    }
                }

                let updated = diesel::update(users::table.filter(users::id.eq(user_id)))
                    .set(changeset)
                    .execute(conn)
                    .await?;
                Ok(Ok(updated > 0))
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, "update_user", Some(user)))?
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.filter(users::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(|err| match classify_diesel_error(err, "delete_user") {
                DieselFailure::ForeignKeyViolation { .. } => UserRepositoryError::in_use(id.as_ref()),
                DieselFailure::Connection { message } => UserRepositoryError::connection(message),
                DieselFailure::UniqueViolation { .. } => {
                    UserRepositoryError::query("unique constraint violated")
                }
                DieselFailure::Query { message } => UserRepositoryError::query(message),
            })?;
        Ok(deleted > 0)
    }
}
