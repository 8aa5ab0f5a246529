//! Driving port for reading tickets.

use async_trait::async_trait;

use super::TicketFilter;
use crate::domain::{Error, Identity, Ticket, TicketId};

#[async_trait]
pub trait TicketQuery: Send + Sync {
    /// Fetch a ticket the caller may see.
    async fn get_ticket(&self, identity: &Identity, ticket_id: TicketId) -> Result<Ticket, Error>;

    /// Tickets visible to the caller, newest first. End users only see
    /// tickets they created.
    async fn list_tickets(
        &self,
        identity: &Identity,
        filter: TicketFilter,
    ) -> Result<Vec<Ticket>, Error>;
}
