//! Driving port for ticket mutations.
//!
//! Each mutation loads the ticket, asks the policy, runs the state machine
//! and persists the outcome under an optimistic revision check. A lost race
//! surfaces as `conflict`, which callers may retry.

use async_trait::async_trait;

use crate::domain::{Error, Identity, NewTicket, Ticket, TicketEdit, TicketId, UserId};

#[async_trait]
pub trait TicketCommand: Send + Sync {
    /// Open a ticket owned by the caller.
    async fn create_ticket(&self, identity: &Identity, ticket: NewTicket) -> Result<Ticket, Error>;

    /// Staff-only content edit. An empty edit is rejected as invalid input.
    async fn edit_ticket(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        edit: TicketEdit,
    ) -> Result<Ticket, Error>;

    /// Staff-only status change. `status` is the raw wire value so unknown
    /// values are reported by the policy.
    async fn change_status(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        status: &str,
    ) -> Result<Ticket, Error>;

    /// Admin-only assignment; `None` unassigns.
    async fn assign(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        technician_id: Option<UserId>,
    ) -> Result<Ticket, Error>;

    /// A technician takes an unassigned ticket.
    async fn self_assign(&self, identity: &Identity, ticket_id: TicketId) -> Result<Ticket, Error>;
}
