//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types re-run the
//! domain validators, so a row edited by hand into an invalid state surfaces
//! as a query error instead of a broken aggregate.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentId, CommentText, DisplayName, EmailAddress, PasswordHash, Ticket,
    TicketDescription, TicketId, TicketParts, TicketTitle, User, UserId, UserParts,
};

use super::diesel_helpers::{cast_revision, cast_revision_for_db};
use super::schema::{comments, tickets, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for overwriting the mutable user columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email().as_ref(),
            password_hash: user.password_hash().as_str(),
            display_name: user.display_name().as_ref(),
            role: user.role().as_str(),
            active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

impl<'a> From<&'a User> for UserChangeset<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            email: user.email().as_ref(),
            password_hash: user.password_hash().as_str(),
            display_name: user.display_name().as_ref(),
            role: user.role().as_str(),
            active: user.is_active(),
            updated_at: user.updated_at(),
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let invalid = |err: crate::domain::UserValidationError| {
            format!("invalid user row {}: {err}", row.id)
        };
        Ok(User::from(UserParts {
            id: UserId::from_uuid(row.id),
            email: EmailAddress::new(&row.email).map_err(invalid)?,
            password_hash: PasswordHash::new(row.password_hash.clone()).map_err(invalid)?,
            display_name: DisplayName::new(&row.display_name).map_err(invalid)?,
            role: row.role.parse().map_err(invalid)?,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

// ---------------------------------------------------------------------------
// Ticket models
// ---------------------------------------------------------------------------

/// Row struct for reading from the tickets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub category: String,
    pub creator_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i32,
}

/// Insertable struct for new tickets.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub(crate) struct NewTicketRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub priority: &'a str,
    pub category: &'a str,
    pub creator_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i32,
}

/// Changeset for a conditional ticket overwrite.
///
/// `treat_none_as_null` lets unassignment clear the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TicketChangeset<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub priority: &'a str,
    pub category: &'a str,
    pub assigned_to: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub revision: i32,
}

impl<'a> From<&'a Ticket> for NewTicketRow<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        Self {
            id: *ticket.id().as_uuid(),
            title: ticket.title().as_ref(),
            description: ticket.description().as_ref(),
            status: ticket.status().as_str(),
            priority: ticket.priority().as_str(),
            category: ticket.category().as_str(),
            creator_id: *ticket.creator_id().as_uuid(),
            assigned_to: ticket.assigned_to().map(|user| *user.as_uuid()),
            created_at: ticket.created_at(),
            updated_at: ticket.updated_at(),
            revision: cast_revision_for_db(ticket.revision()),
        }
    }
}

impl<'a> From<&'a Ticket> for TicketChangeset<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        Self {
            title: ticket.title().as_ref(),
            description: ticket.description().as_ref(),
            status: ticket.status().as_str(),
            priority: ticket.priority().as_str(),
            category: ticket.category().as_str(),
            assigned_to: ticket.assigned_to().map(|user| *user.as_uuid()),
            updated_at: ticket.updated_at(),
            revision: cast_revision_for_db(ticket.revision()),
        }
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = String;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let invalid = |err: crate::domain::TicketValidationError| {
            format!("invalid ticket row {}: {err}", row.id)
        };
        Ok(Ticket::from(TicketParts {
            id: TicketId::from_uuid(row.id),
            title: TicketTitle::new(&row.title).map_err(invalid)?,
            description: TicketDescription::new(row.description.clone()).map_err(invalid)?,
            status: row.status.parse().map_err(invalid)?,
            priority: row.priority.parse().map_err(invalid)?,
            category: row.category.parse().map_err(invalid)?,
            creator_id: UserId::from_uuid(row.creator_id),
            assigned_to: row.assigned_to.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
            revision: cast_revision(row.revision),
        }))
    }
}

// ---------------------------------------------------------------------------
// Comment models
// ---------------------------------------------------------------------------

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sequence: i64,
}

/// Insertable struct for new comments. `sequence` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub text: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = String;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let text = CommentText::new(&row.text)
            .map_err(|err| format!("invalid comment row {}: {err}", row.id))?;
        Ok(Comment {
            id: CommentId::from_uuid(row.id),
            ticket_id: TicketId::from_uuid(row.ticket_id),
            user_id: UserId::from_uuid(row.user_id),
            text,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sequence: row.sequence,
        })
    }
}
