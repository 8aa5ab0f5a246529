//! Port for ticket persistence.
//!
//! The [`TicketRepository`] trait stores tickets with optimistic concurrency:
//! every write names the revision it was computed from, and the adapter
//! applies it only if that revision is still current. The check and the write
//! are atomic, so a concurrent writer observes either the complete previous
//! transition or none of it.

use async_trait::async_trait;

use crate::domain::policy::TicketScope;
use crate::domain::{Ticket, TicketId, TicketStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ticket repository adapters.
    pub enum TicketRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ticket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ticket repository query failed: {message}",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
        /// The ticket vanished between load and save.
        Missing { ticket_id: String } =>
            "ticket not found: {ticket_id}",
        /// The new assignee no longer holds the `tecnico` role.
        AssigneeNotTechnician { user_id: String } =>
            "assignee {user_id} is not a technician",
        /// The new assignee's account is deactivated.
        AssigneeInactive { user_id: String } =>
            "assignee {user_id} is inactive",
    }
}

/// Optional listing filters, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<UserId>,
}

impl TicketFilter {
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.is_none_or(|status| ticket.status() == status)
            && self
                .assigned_to
                .as_ref()
                .is_none_or(|user| ticket.assigned_to() == Some(user))
    }
}

/// Port for ticket storage and retrieval.
///
/// # Revision Semantics
///
/// - New tickets are inserted at revision 1.
/// - The caller bumps `ticket.revision` before calling [`save`](Self::save)
///   and passes the revision it loaded as `expected_revision`.
/// - [`TicketRepositoryError::RevisionMismatch`] is returned when the stored
///   revision differs; nothing is written in that case.
/// - When a save changes the assignee, the adapter re-reads that user in the
///   same atomic step and refuses anyone who is not an active `tecnico`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Fetch a ticket by identifier.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError>;

    /// Store a brand new ticket.
    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError>;

    /// Conditionally overwrite a ticket.
    async fn save(
        &self,
        ticket: &Ticket,
        expected_revision: u32,
    ) -> Result<(), TicketRepositoryError>;

    /// Tickets within `scope` that match `filter`, newest first.
    async fn list(
        &self,
        scope: &TicketScope,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>, TicketRepositoryError>;

    /// Number of tickets currently assigned to `user_id`.
    async fn count_assigned_to(&self, user_id: &UserId) -> Result<u64, TicketRepositoryError>;
}
