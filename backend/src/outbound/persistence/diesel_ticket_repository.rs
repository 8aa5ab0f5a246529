//! PostgreSQL-backed `TicketRepository` implementation using Diesel ORM.
//!
//! Saves run in one transaction: the ticket row is locked with
//! `SELECT ... FOR UPDATE` and its revision compared, a newly named assignee
//! is read under `FOR SHARE` and must be an active `tecnico`, and only then is
//! the row overwritten. A concurrent role change on that user waits for the
//! save to commit, and vice versa.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::policy::TicketScope;
use crate::domain::ports::{TicketFilter, TicketRepository, TicketRepositoryError};
use crate::domain::{Role, Ticket, TicketId, UserId};

use super::diesel_helpers::{
    DieselFailure, cast_revision, classify_diesel_error, collect_rows, map_pool_error_message,
};
use super::models::{NewTicketRow, TicketChangeset, TicketRow};
use super::pool::{DbPool, PoolError};
use super::schema::{tickets, users};

/// Diesel-backed implementation of the [`TicketRepository`] port.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TicketRepositoryError {
    TicketRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &'static str) -> TicketRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::ForeignKeyViolation { .. } => {
            TicketRepositoryError::query("referenced user does not exist")
        }
        DieselFailure::UniqueViolation { .. } => {
            TicketRepositoryError::query("ticket already exists")
        }
        DieselFailure::Connection { message } => TicketRepositoryError::connection(message),
        DieselFailure::Query { message } => TicketRepositoryError::query(message),
    }
}

fn row_to_ticket(row: TicketRow) -> Result<Ticket, String> {
    Ticket::try_from(row)
}

/// Judge the locked `(role, active)` row of a newly named assignee.
fn check_assignee(
    assignee: &UserId,
    row: Option<(String, bool)>,
) -> Result<(), TicketRepositoryError> {
    let Some((role, active)) = row else {
        return Err(TicketRepositoryError::query("referenced user does not exist"));
    };
    if role != Role::Tecnico.as_str() {
        return Err(TicketRepositoryError::assignee_not_technician(
            assignee.as_ref(),
        ));
    }
    if !active {
        return Err(TicketRepositoryError::assignee_inactive(assignee.as_ref()));
    }
    Ok(())
}

/// Explain a locked row that is absent or at another revision.
fn zero_row_outcome(
    ticket_id: &TicketId,
    expected_revision: u32,
    current_revision: Option<i32>,
) -> TicketRepositoryError {
    match current_revision {
        Some(actual) => {
            TicketRepositoryError::revision_mismatch(expected_revision, cast_revision(actual))
        }
        None => TicketRepositoryError::missing(ticket_id.to_string()),
    }
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = tickets::table
            .filter(tickets::id.eq(id.as_uuid()))
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find_ticket"))?;
        row.map(row_to_ticket)
            .transpose()
            .map_err(TicketRepositoryError::query)
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(tickets::table)
            .values(NewTicketRow::from(ticket))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, "insert_ticket"))
    }

    async fn save(
        &self,
        ticket: &Ticket,
        expected_revision: u32,
    ) -> Result<(), TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ticket_id = ticket.id();
        let assignee = ticket.assigned_to();
        let changeset = TicketChangeset::from(ticket);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let current: Option<(i32, Option<Uuid>)> = tickets::table
                    .filter(tickets::id.eq(ticket_id.as_uuid()))
                    .select((tickets::revision, tickets::assigned_to))
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let previous = match current {
                    Some((revision, previous)) if cast_revision(revision) == expected_revision => {
                        previous
                    }
                    other => {
                        let revision = other.map(|(revision, _)| revision);
                        return Ok(Err(zero_row_outcome(
                            &ticket_id,
                            expected_revision,
                            revision,
                        )));
                    }
                };

                if let Some(assignee) = assignee.filter(|id| Some(*id.as_uuid()) != previous) {
                    let row: Option<(String, bool)> = users::table
                        .filter(users::id.eq(assignee.as_uuid()))
                        .select((users::role, users::active))
                        .for_share()
                        .first(conn)
                        .await
                        .optional()?;
                    if let Err(rejected) = check_assignee(assignee, row) {
                        return Ok(Err(rejected));
                    }
                }

                diesel::update(tickets::table.filter(tickets::id.eq(ticket_id.as_uuid())))
                    .set(changeset)
                    .execute(conn)
                    .await?;
                Ok(Ok(()))
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, "save_ticket"))?
    }

    async fn list(
        &self,
        scope: &TicketScope,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = tickets::table
            .select(TicketRow::as_select())
            .order_by((tickets::created_at.desc(), tickets::id.desc()))
            .into_boxed();
        if let TicketScope::CreatedBy(user_id) = scope {
            query = query.filter(tickets::creator_id.eq(*user_id.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(tickets::status.eq(status.as_str()));
        }
        if let Some(assignee) = &filter.assigned_to {
            query = query.filter(tickets::assigned_to.eq(*assignee.as_uuid()));
        }

        let rows: Vec<TicketRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list_tickets"))?;
        collect_rows(rows.into_iter().map(row_to_ticket), TicketRepositoryError::query)
    }

    async fn count_assigned_to(&self, user_id: &UserId) -> Result<u64, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = tickets::table
            .filter(tickets::assigned_to.eq(user_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "count_assigned_tickets"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn stale_revision_reports_both_sides() {
        let ticket_id = TicketId::random();
        assert_eq!(
            zero_row_outcome(&ticket_id, 2, Some(3)),
            TicketRepositoryError::revision_mismatch(2_u32, 3_u32)
        );
    }

    #[rstest]
    fn vanished_ticket_is_missing() {
        let ticket_id = TicketId::random();
        assert_eq!(
            zero_row_outcome(&ticket_id, 2, None),
            TicketRepositoryError::missing(ticket_id.to_string())
        );
    }

    #[rstest]
    #[case::technician("tecnico", true, None)]
    #[case::demoted("usuario", true, Some("not_technician"))]
    #[case::promoted_to_admin("admin", true, Some("not_technician"))]
    #[case::deactivated("tecnico", false, Some("inactive"))]
    fn assignee_must_be_an_active_technician(
        #[case] role: &str,
        #[case] active: bool,
        #[case] rejection: Option<&str>,
    ) {
        let assignee = UserId::random();
        let outcome = check_assignee(&assignee, Some((role.to_owned(), active)));
        let expected = match rejection {
            None => Ok(()),
            Some("inactive") => Err(TicketRepositoryError::assignee_inactive(assignee.as_ref())),
            Some(_) => Err(TicketRepositoryError::assignee_not_technician(
                assignee.as_ref(),
            )),
        };
        assert_eq!(outcome, expected);
    }

    #[rstest]
    fn vanished_assignee_is_a_query_error() {
        assert_eq!(
            check_assignee(&UserId::random(), None),
            Err(TicketRepositoryError::query("referenced user does not exist"))
        );
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let error = map_diesel_error(diesel::result::Error::NotFound, "find_ticket");
        assert_eq!(error, TicketRepositoryError::query("record not found"));
    }
}
