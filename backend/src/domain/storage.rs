//! Bounded storage calls and repository error mapping shared by services.
//!
//! Every call a service makes to a driven port runs under a
//! [`StorageDeadline`]. Expiry and connection failures surface as
//! `service_unavailable`, which clients may retry.

use std::future::Future;
use std::time::Duration;

use serde_json::json;
use tracing::warn;

use super::Error;
use super::ports::{
    CommentRepositoryError, PasswordHasherError, TicketRepositoryError, UserRepositoryError,
};

/// Upper bound applied to each storage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageDeadline(Duration);

impl Default for StorageDeadline {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl StorageDeadline {
    pub const DEFAULT: Duration = Duration::from_secs(5);

    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self(limit)
    }

    #[must_use]
    pub const fn limit(self) -> Duration {
        self.0
    }

    /// Await `call`, mapping its error with `map` and expiry to
    /// `service_unavailable`.
    pub async fn run<T, E, F>(
        self,
        operation: &'static str,
        call: F,
        map: fn(E) -> Error,
    ) -> Result<T, Error>
    where
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.0, call).await {
            Ok(result) => result.map_err(map),
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX),
                    "storage call timed out"
                );
                Err(Error::service_unavailable("storage timed out")
                    .with_details(json!({ "operation": operation })))
            }
        }
    }
}

pub(crate) fn map_ticket_error(error: TicketRepositoryError) -> Error {
    match error {
        TicketRepositoryError::Connection { message } => {
            warn!(%message, "ticket repository unavailable");
            Error::service_unavailable("ticket repository unavailable")
        }
        TicketRepositoryError::Query { message } => {
            Error::internal(format!("ticket repository error: {message}"))
        }
        TicketRepositoryError::RevisionMismatch { expected, actual } => {
            Error::conflict("ticket was modified concurrently").with_details(json!({
                "expectedRevision": expected,
                "actualRevision": actual,
                "code": "revision_mismatch",
            }))
        }
        TicketRepositoryError::Missing { ticket_id } => Error::not_found("ticket not found")
            .with_details(json!({ "ticketId": ticket_id, "code": "ticket_not_found" })),
        TicketRepositoryError::AssigneeNotTechnician { user_id } => {
            Error::invalid_operation("user is not a technician")
                .with_details(json!({ "technicianId": user_id, "code": "not_a_technician" }))
        }
        TicketRepositoryError::AssigneeInactive { user_id } => {
            Error::invalid_operation("technician account is inactive")
                .with_details(json!({ "technicianId": user_id, "code": "inactive_technician" }))
        }
    }
}

pub(crate) fn map_comment_error(error: CommentRepositoryError) -> Error {
    match error {
        CommentRepositoryError::Connection { message } => {
            warn!(%message, "comment repository unavailable");
            Error::service_unavailable("comment repository unavailable")
        }
        CommentRepositoryError::Query { message } => {
            Error::internal(format!("comment repository error: {message}"))
        }
        CommentRepositoryError::TicketMissing { ticket_id } => Error::not_found("ticket not found")
            .with_details(json!({ "ticketId": ticket_id, "code": "ticket_not_found" })),
    }
}

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            warn!(%message, "user repository unavailable");
            Error::service_unavailable("user repository unavailable")
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { .. } => Error::invalid_operation(
            "email already registered",
        )
        .with_details(json!({ "field": "email", "code": "duplicate_email" })),
        UserRepositoryError::InUse { user_id } => {
            Error::invalid_operation("user is still referenced by tickets or comments")
                .with_details(json!({ "userId": user_id, "code": "user_in_use" }))
        }
        UserRepositoryError::StillAssigned { user_id } => {
            Error::invalid_operation("technician still has assigned tickets")
                .with_details(json!({ "userId": user_id, "code": "technician_has_assignments" }))
        }
    }
}

pub(crate) fn map_hasher_error(error: PasswordHasherError) -> Error {
    match error {
        PasswordHasherError::Hash { message } => {
            Error::internal(format!("password hashing failed: {message}"))
        }
    }
}
