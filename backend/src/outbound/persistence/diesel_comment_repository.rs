//! PostgreSQL-backed `CommentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CommentRepository, CommentRepositoryError};
use crate::domain::{Comment, CommentId, NewComment, TicketId};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, constraint_mentions,
    map_pool_error_message,
};
use super::models::{CommentRow, NewCommentRow};
use super::pool::{DbPool, PoolError};
use super::schema::comments;

/// Diesel-backed implementation of the [`CommentRepository`] port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CommentRepositoryError {
    CommentRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
    ticket_id: Option<&TicketId>,
) -> CommentRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::ForeignKeyViolation { constraint } => match ticket_id {
            Some(ticket_id) if !constraint_mentions(constraint.as_deref(), "user_id") => {
                CommentRepositoryError::ticket_missing(ticket_id.to_string())
            }
            _ => CommentRepositoryError::query("referenced user does not exist"),
        },
        DieselFailure::UniqueViolation { .. } => {
            CommentRepositoryError::query("comment already exists")
        }
        DieselFailure::Connection { message } => CommentRepositoryError::connection(message),
        DieselFailure::Query { message } => CommentRepositoryError::query(message),
    }
}

fn row_to_comment(row: CommentRow) -> Result<Comment, String> {
    Comment::try_from(row)
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn list_for_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CommentRow> = comments::table
            .filter(comments::ticket_id.eq(ticket_id.as_uuid()))
            .select(CommentRow::as_select())
            .order_by((comments::created_at.asc(), comments::sequence.asc()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list_comments", None))?;
        collect_rows(rows.into_iter().map(row_to_comment), CommentRepositoryError::query)
    }

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = comments::table
            .filter(comments::id.eq(id.as_uuid()))
            .select(CommentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find_comment", None))?;
        row.map(row_to_comment)
            .transpose()
            .map_err(CommentRepositoryError::query)
    }

    async fn insert(&self, comment: NewComment) -> Result<Comment, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewCommentRow {
            id: *comment.id.as_uuid(),
            ticket_id: *comment.ticket_id.as_uuid(),
            user_id: *comment.user_id.as_uuid(),
            text: comment.text.as_ref(),
            created_at: comment.created_at,
            updated_at: comment.created_at,
        };
        let sequence: i64 = diesel::insert_into(comments::table)
            .values(&row)
            .returning(comments::sequence)
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert_comment", Some(&comment.ticket_id)))?;
        Ok(Comment::stored(comment, sequence))
    }

    async fn delete(&self, id: &CommentId) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(comments::table.filter(comments::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "delete_comment", None))?;
        Ok(deleted > 0)
    }
}
