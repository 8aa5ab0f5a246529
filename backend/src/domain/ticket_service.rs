//! Ticket facade: load, authorize, transition, persist.
//!
//! Every mutation follows the same path. The ticket is loaded, the policy
//! is asked, the state machine computes the next `(status, assignment)`
//! pair, and the result is saved under the revision that was loaded. A
//! concurrent writer that got there first makes the save fail with
//! `conflict`; nothing is written in that case.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::policy::{Action, DenyReason, TicketScope, enforce};
use crate::domain::ports::{
    TicketCommand, TicketFilter, TicketQuery, TicketRepository, UserRepository,
};
use crate::domain::storage::{StorageDeadline, map_ticket_error, map_user_error};
use crate::domain::ticket_lifecycle::{
    TechnicianError, Technician, TicketOperation, TransitionError,
};
use crate::domain::{
    Error, Identity, NewTicket, Ticket, TicketEdit, TicketId, TicketStatus, UserId,
};

/// Requested transition before the policy and state machine have run.
#[derive(Debug, Clone)]
enum TransitionRequest {
    ChangeStatus(Option<TicketStatus>),
    Assign(Option<UserId>),
    SelfAssign,
}

/// Domain service implementing [`TicketCommand`] and [`TicketQuery`].
#[derive(Clone)]
pub struct TicketService<T, U> {
    tickets: Arc<T>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    deadline: StorageDeadline,
}

impl<T, U> TicketService<T, U> {
    pub fn new(tickets: Arc<T>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tickets,
            users,
            clock,
            deadline: StorageDeadline::default(),
        }
    }

    /// Override the bound applied to each storage call.
    #[must_use]
    pub fn with_deadline(mut self, deadline: StorageDeadline) -> Self {
        self.deadline = deadline;
        self
    }
}

impl<T, U> TicketService<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    async fn load(&self, ticket_id: TicketId) -> Result<Ticket, Error> {
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

    async fn persist(&self, ticket: &Ticket, expected_revision: u32) -> Result<(), Error> {
        self.deadline
            .run(
                "save_ticket",
                self.tickets.save(ticket, expected_revision),
                map_ticket_error,
            )
            .await
    }

    /// Look up the user to assign and prove they are an active technician.
    async fn resolve_technician(&self, user_id: &UserId) -> Result<Technician, Error> {
        let user = self
            .deadline
            .run("find_user", self.users.find_by_id(user_id), map_user_error)
            .await?
            .ok_or_else(|| {
                Error::not_found("technician not found").with_details(json!({
                    "technicianId": user_id.to_string(),
                    "code": "technician_not_found",
                }))
            })?;
        Technician::try_from_user(&user).map_err(|err| {
            let code = match err {
                TechnicianError::NotTechnician => "not_a_technician",
                TechnicianError::Inactive => "inactive_technician",
            };
            Error::invalid_operation(err.to_string()).with_details(json!({
                "technicianId": user_id.to_string(),
                "code": code,
            }))
        })
    }

    async fn apply_transition(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        request: TransitionRequest,
    ) -> Result<Ticket, Error> {
        let mut ticket = self.load(ticket_id).await?;

        let operation = match request {
            TransitionRequest::ChangeStatus(target) => {
                enforce(identity, Action::ChangeStatus { target })?;
                let status = target.ok_or_else(|| Error::from(DenyReason::InvalidStatus))?;
                TicketOperation::ChangeStatus(status)
            }
            TransitionRequest::Assign(technician_id) => {
                enforce(identity, Action::AssignTicket)?;
                match technician_id {
                    Some(id) => TicketOperation::Assign(self.resolve_technician(&id).await?),
                    None => TicketOperation::Unassign,
                }
            }
            TransitionRequest::SelfAssign => {
                enforce(identity, Action::SelfAssign(&ticket))?;
                let technician = Technician::try_from_identity(identity)
                    .map_err(|_| Error::from(DenyReason::TechnicianOnly))?;
                TicketOperation::SelfAssign(technician)
            }
        };

        let operation_name = operation.name();
        let transition = ticket.state().apply(operation).map_err(|err| match err {
            TransitionError::AlreadyAssigned => Error::from(DenyReason::AlreadyAssigned),
        })?;
        if !transition.changed {
            debug!(ticket_id = %ticket_id, operation = operation_name, "transition is a no-op");
            return Ok(ticket);
        }

        let expected_revision = ticket.revision();
        ticket.apply_state(transition.state, self.clock.utc());
        self.persist(&ticket, expected_revision).await?;
        info!(
            ticket_id = %ticket_id,
            operation = operation_name,
            actor = %identity.user_id(),
            status = %ticket.status(),
            revision = ticket.revision(),
            "ticket transition applied"
        );
        Ok(ticket)
    }
}

#[async_trait]
impl<T, U> TicketCommand for TicketService<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    async fn create_ticket(&self, identity: &Identity, ticket: NewTicket) -> Result<Ticket, Error> {
        enforce(identity, Action::CreateTicket)?;
        let ticket = Ticket::open(ticket, identity.user_id().clone(), self.clock.utc());
        self.deadline
            .run("insert_ticket", self.tickets.insert(&ticket), map_ticket_error)
            .await?;
        info!(ticket_id = %ticket.id(), creator = %identity.user_id(), "ticket created");
        Ok(ticket)
    }

    async fn edit_ticket(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        edit: TicketEdit,
    ) -> Result<Ticket, Error> {
        if edit.is_empty() {
            return Err(Error::invalid_request("edit must change at least one field")
                .with_details(json!({ "code": "empty_edit" })));
        }
        let mut ticket = self.load(ticket_id).await?;
        enforce(identity, Action::EditTicket(&ticket))?;

        let expected_revision = ticket.revision();
        ticket.apply_edit(edit, self.clock.utc());
        self.persist(&ticket, expected_revision).await?;
        info!(ticket_id = %ticket_id, actor = %identity.user_id(), "ticket edited");
        Ok(ticket)
    }

    async fn change_status(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        status: &str,
    ) -> Result<Ticket, Error> {
        let target = status.parse::<TicketStatus>().ok();
        self.apply_transition(identity, ticket_id, TransitionRequest::ChangeStatus(target))
            .await
    }

    async fn assign(
        &self,
        identity: &Identity,
        ticket_id: TicketId,
        technician_id: Option<UserId>,
    ) -> Result<Ticket, Error> {
        self.apply_transition(identity, ticket_id, TransitionRequest::Assign(technician_id))
            .await
    }

    async fn self_assign(&self, identity: &Identity, ticket_id: TicketId) -> Result<Ticket, Error> {
        self.apply_transition(identity, ticket_id, TransitionRequest::SelfAssign)
            .await
    }
}

#[async_trait]
impl<T, U> TicketQuery for TicketService<T, U>
where
    T: TicketRepository,
    U: UserRepository,
{
    async fn get_ticket(&self, identity: &Identity, ticket_id: TicketId) -> Result<Ticket, Error> {
        let ticket = self.load(ticket_id).await?;
        enforce(identity, Action::ViewTicket(&ticket))?;
        Ok(ticket)
    }

    async fn list_tickets(
        &self,
        identity: &Identity,
        filter: TicketFilter,
    ) -> Result<Vec<Ticket>, Error> {
        enforce(identity, Action::ListTickets)?;
        let scope = TicketScope::for_identity(identity);
        self.deadline
            .run("list_tickets", self.tickets.list(&scope, &filter), map_ticket_error)
            .await
    }
}

#[cfg(test)]
#[path = "ticket_service_tests.rs"]
mod tests;
