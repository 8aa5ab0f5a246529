//! Driving port for ticket comments.

use async_trait::async_trait;

use crate::domain::{Comment, CommentId, Error, Identity, TicketId};

#[async_trait]
pub trait TicketComments: Send + Sync {
    /// Comments on a visible ticket, oldest first.
    async fn list_comments(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
    ) -> Result<Vec<Comment>, Error>;

    /// Add a comment. Text is validated before the ticket is loaded.
    async fn add_comment(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        text: &str,
    ) -> Result<Comment, Error>;

    /// Remove a comment; only its author or an admin may.
    async fn delete_comment(&self, identity: &Identity, comment_id: CommentId)
    -> Result<(), Error>;
}
