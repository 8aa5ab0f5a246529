//! In-process storage adapter.
//!
//! [`InMemoryStore`] implements the user, ticket and comment repository
//! ports over one mutex-guarded state, so the reference checks Postgres does
//! with foreign keys (creator and assignee exist, users still referenced
//! cannot be deleted, comments need a live ticket) hold here too. The server
//! uses it when no database URL is configured; tests use it as a fake.
//!
//! Every operation takes the lock once and never awaits while holding it,
//! which makes each call atomic. In particular the revision check and write
//! in [`TicketRepository::save`] cannot interleave with another save, and the
//! assignee it checks cannot be demoted before the write lands.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::policy::TicketScope;
use crate::domain::ports::{
    CommentRepository, CommentRepositoryError, TicketFilter, TicketRepository,
    TicketRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Comment, CommentId, EmailAddress, NewComment, Role, Ticket, TicketId, User, UserId,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    tickets: HashMap<TicketId, Ticket>,
    comments: HashMap<CommentId, Comment>,
    last_sequence: i64,
}

impl State {
    fn user_is_referenced(&self, user_id: &UserId) -> bool {
        self.tickets.values().any(|ticket| {
            ticket.creator_id() == user_id || ticket.assigned_to() == Some(user_id)
        }) || self
            .comments
            .values()
            .any(|comment| &comment.user_id == user_id)
    }

    fn email_taken_by_other(&self, user: &User) -> bool {
        self.users
            .values()
            .any(|other| other.email() == user.email() && other.id() != user.id())
    }

    fn has_assignments(&self, user_id: &UserId) -> bool {
        self.tickets
            .values()
            .any(|ticket| ticket.assigned_to() == Some(user_id))
    }

    /// Refuse a user who is leaving the `tecnico` role with tickets assigned.
    fn check_role_change(&self, user: &User) -> Result<(), UserRepositoryError> {
        let leaving_technician = self
            .users
            .get(user.id())
            .is_some_and(|stored| stored.role() == Role::Tecnico && user.role() != Role::Tecnico);
        if leaving_technician && self.has_assignments(user.id()) {
            return Err(UserRepositoryError::still_assigned(user.id().as_ref()));
        }
        Ok(())
    }

    /// Refuse a newly named assignee who is not an active technician.
    fn check_new_assignee(
        &self,
        ticket: &Ticket,
        previous: Option<&UserId>,
    ) -> Result<(), TicketRepositoryError> {
        let Some(assignee) = ticket.assigned_to().filter(|id| Some(*id) != previous) else {
            return Ok(());
        };
        let Some(user) = self.users.get(assignee) else {
            return Err(TicketRepositoryError::query("referenced user does not exist"));
        };
        if user.role() != Role::Tecnico {
            return Err(TicketRepositoryError::assignee_not_technician(
                assignee.as_ref(),
            ));
        }
        if !user.is_active() {
            return Err(TicketRepositoryError::assignee_inactive(assignee.as_ref()));
        }
        Ok(())
    }

    fn ticket_references_exist(&self, ticket: &Ticket) -> bool {
        self.users.contains_key(ticket.creator_id())
            && ticket
                .assigned_to()
                .is_none_or(|assignee| self.users.contains_key(assignee))
    }
}

/// Shared in-memory storage. Clones share the same state.
///
/// # Examples
/// ```
/// use helpdesk::domain::ports::UserRepository;
/// use helpdesk::outbound::memory::InMemoryStore;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let store = InMemoryStore::new();
/// assert!(store.list().await.expect("list users").is_empty());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

const POISONED: &str = "in-memory store lock poisoned";

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, &'static str> {
        self.state.lock().map_err(|_| POISONED)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state
            .users
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if state.email_taken_by_other(user) {
            return Err(UserRepositoryError::duplicate_email(user.email().as_ref()));
        }
        if state.users.contains_key(user.id()) {
            return Err(UserRepositoryError::query("user already exists"));
        }
        state.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if !state.users.contains_key(user.id()) {
            return Ok(false);
        }
        if state.email_taken_by_other(user) {
            return Err(UserRepositoryError::duplicate_email(user.email().as_ref()));
        }
        state.check_role_change(user)?;
        state.users.insert(user.id().clone(), user.clone());
        Ok(true)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if !state.users.contains_key(id) {
            return Ok(false);
        }
        if state.user_is_referenced(id) {
            return Err(UserRepositoryError::in_use(id.as_ref()));
        }
        state.users.remove(id);
        Ok(true)
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, TicketRepositoryError> {
        let state = self.lock().map_err(TicketRepositoryError::query)?;
        Ok(state.tickets.get(id).cloned())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), TicketRepositoryError> {
        let mut state = self.lock().map_err(TicketRepositoryError::query)?;
        if !state.ticket_references_exist(ticket) {
            return Err(TicketRepositoryError::query("referenced user does not exist"));
        }
        if state.tickets.contains_key(&ticket.id()) {
            return Err(TicketRepositoryError::query("ticket already exists"));
        }
        state.tickets.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn save(
        &self,
        ticket: &Ticket,
        expected_revision: u32,
    ) -> Result<(), TicketRepositoryError> {
        let mut state = self.lock().map_err(TicketRepositoryError::query)?;
        let stored = state
            .tickets
            .get(&ticket.id())
            .ok_or_else(|| TicketRepositoryError::missing(ticket.id().to_string()))?;
        if stored.revision() != expected_revision {
            return Err(TicketRepositoryError::revision_mismatch(
                expected_revision,
                stored.revision(),
            ));
        }
        state.check_new_assignee(ticket, stored.assigned_to())?;
        if !state.ticket_references_exist(ticket) {
            return Err(TicketRepositoryError::query("referenced user does not exist"));
        }
        state.tickets.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn list(
        &self,
        scope: &TicketScope,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let state = self.lock().map_err(TicketRepositoryError::query)?;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|ticket| scope.includes(ticket) && filter.matches(ticket))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().as_uuid().cmp(a.id().as_uuid()))
        });
        Ok(tickets)
    }

    async fn count_assigned_to(&self, user_id: &UserId) -> Result<u64, TicketRepositoryError> {
        let state = self.lock().map_err(TicketRepositoryError::query)?;
        let count = state
            .tickets
            .values()
            .filter(|ticket| ticket.assigned_to() == Some(user_id))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let state = self.lock().map_err(CommentRepositoryError::query)?;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| &comment.ticket_id == ticket_id)
            .cloned()
            .collect();
        comments.sort_by_key(Comment::order_key);
        Ok(comments)
    }

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        let state = self.lock().map_err(CommentRepositoryError::query)?;
        Ok(state.comments.get(id).cloned())
    }

    async fn insert(&self, comment: NewComment) -> Result<Comment, CommentRepositoryError> {
        let mut state = self.lock().map_err(CommentRepositoryError::query)?;
        if !state.tickets.contains_key(&comment.ticket_id) {
            return Err(CommentRepositoryError::ticket_missing(
                comment.ticket_id.to_string(),
            ));
        }
        if !state.users.contains_key(&comment.user_id) {
            return Err(CommentRepositoryError::query(
                "referenced user does not exist",
            ));
        }
        state.last_sequence += 1;
        let stored = Comment::stored(comment, state.last_sequence);
        state.comments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &CommentId) -> Result<bool, CommentRepositoryError> {
        let mut state = self.lock().map_err(CommentRepositoryError::query)?;
        Ok(state.comments.remove(id).is_some())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
