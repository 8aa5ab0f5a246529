//! Comment use-cases on top of the ticket and comment repositories.
//!
//! Visibility of comments follows visibility of the parent ticket, so every
//! call loads the ticket before asking the policy.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::policy::{Action, enforce};
use crate::domain::ports::{CommentRepository, TicketComments, TicketRepository};
use crate::domain::storage::{StorageDeadline, map_comment_error, map_ticket_error};
use crate::domain::{
    Comment, CommentId, CommentText, CommentValidationError, Error, Identity, NewComment, Ticket,
    TicketId,
};

/// Domain service implementing [`TicketComments`].
#[derive(Clone)]
pub struct CommentService<T, C> {
    tickets: Arc<T>,
    comments: Arc<C>,
    clock: Arc<dyn Clock>,
    deadline: StorageDeadline,
}

impl<T, C> CommentService<T, C> {
    pub fn new(tickets: Arc<T>, comments: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tickets,
            comments,
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

impl<T, C> CommentService<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    async fn load_ticket(&self, ticket_id: TicketId) -> Result<Ticket, Error> {
        self.deadline
            .run(
                "find_ticket",
                self.tickets.find_by_id(&ticket_id),
                map_ticket_error,
            )
            .await?
            .ok_or_else(|| {
                Error::not_found("ticket not found").with_details(json!({
                    "ticketId": ticket_id.to_string(),
                    "code": "ticket_not_found",
                }))
            })
    }
}

fn invalid_text(err: &CommentValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": "text",
        "code": err.code(),
    }))
}

#[async_trait]
impl<T, C> TicketComments for CommentService<T, C>
where
    T: TicketRepository,
    C: CommentRepository,
{
    async fn list_comments(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
    ) -> Result<Vec<Comment>, Error> {
        let ticket = self.load_ticket(ticket_id).await?;
        enforce(identity, Action::ViewComments(&ticket))?;
        let mut comments = self
            .deadline
            .run(
                "list_comments",
                self.comments.list_for_ticket(&ticket_id),
                map_comment_error,
            )
            .await?;
        comments.sort_by_key(Comment::order_key);
        Ok(comments)
    }

    async fn add_comment(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        text: &str,
    ) -> Result<Comment, Error> {
        let text = CommentText::new(text).map_err(|err| invalid_text(&err))?;
        let ticket = self.load_ticket(ticket_id).await?;
        enforce(identity, Action::CreateComment(&ticket))?;

        let new_comment = NewComment::new(
            ticket_id,
            identity.user_id().clone(),
            text,
            self.clock.utc(),
        );
        let comment = self
            .deadline
            .run(
                "insert_comment",
                self.comments.insert(new_comment),
                map_comment_error,
            )
            .await?;
        info!(
            comment_id = %comment.id,
            ticket_id = %ticket_id,
            author = %identity.user_id(),
            "comment added"
        );
        Ok(comment)
    }

    async fn delete_comment(
        &self,
        identity: &Identity,
        comment_id: CommentId,
    ) -> Result<(), Error> {
        let not_found = || {
            Error::not_found("comment not found").with_details(json!({
                "commentId": comment_id.to_string(),
                "code": "comment_not_found",
            }))
        };
        let comment = self
            .deadline
            .run(
                "find_comment",
                self.comments.find_by_id(&comment_id),
                map_comment_error,
            )
            .await?
            .ok_or_else(not_found)?;
        // The parent must still exist even though only authorship is checked.
        self.load_ticket(comment.ticket_id).await?;
        enforce(identity, Action::DeleteComment(&comment))?;

        let removed = self
            .deadline
            .run(
                "delete_comment",
                self.comments.delete(&comment_id),
                map_comment_error,
            )
            .await?;
        if !removed {
            return Err(not_found());
        }
        info!(comment_id = %comment_id, actor = %identity.user_id(), "comment deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "comment_service_tests.rs"]
mod tests;
