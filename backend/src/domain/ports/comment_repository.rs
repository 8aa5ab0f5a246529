//! Port for ticket comment persistence.

use async_trait::async_trait;

use crate::domain::{Comment, CommentId, NewComment, TicketId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "comment repository query failed: {message}",
        /// The parent ticket does not exist.
        TicketMissing { ticket_id: String } =>
            "ticket not found: {ticket_id}",
    }
}

/// Storage for comments.
///
/// Comments are returned oldest first; equal timestamps are ordered by the
/// insertion sequence the adapter assigns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn list_for_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Vec<Comment>, CommentRepositoryError>;

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError>;

    /// Store a comment and return it with its insertion sequence.
    async fn insert(&self, comment: NewComment) -> Result<Comment, CommentRepositoryError>;

    /// Returns `false` when the comment did not exist.
    async fn delete(&self, id: &CommentId) -> Result<bool, CommentRepositoryError>;
}
