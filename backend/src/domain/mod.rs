//! Domain primitives, policy and services.
//!
//! Purpose: define the strongly typed ticket tracker core. Entities keep
//! their invariants behind constructors, the policy decides who may do
//! what, the lifecycle computes ticket state changes, and the services
//! combine them behind the driving ports in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - User, Ticket, Comment — stored aggregates.
//! - Identity — resolved caller for one request.
//! - TicketService, CommentService, AccountService, UserAdminService —
//!   use-case implementations over the driven ports.

pub mod accounts;
pub mod auth;
pub mod comment;
pub mod comment_service;
pub mod error;
pub mod identity;
pub mod policy;
pub mod ports;
#[cfg(test)]
pub(crate) mod service_test_support;
pub(crate) mod storage;
pub mod ticket;
pub mod ticket_lifecycle;
pub mod ticket_service;
pub mod trace_id;
pub mod user;
pub mod user_admin_service;

pub use self::accounts::AccountService;
pub use self::auth::{
    CredentialValidationError, LoginCredentials, NewPassword, PASSWORD_MAX, PASSWORD_MIN,
};
pub use self::comment::{
    COMMENT_MAX, Comment, CommentId, CommentText, CommentValidationError, NewComment,
};
pub use self::comment_service::CommentService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::identity::Identity;
pub use self::storage::StorageDeadline;
pub use self::ticket::{
    DESCRIPTION_MAX, NewTicket, TITLE_MAX, Ticket, TicketCategory, TicketDescription, TicketEdit,
    TicketId, TicketParts, TicketPriority, TicketStatus, TicketTitle, TicketValidationError,
};
pub use self::ticket_service::TicketService;
pub use self::trace_id::TraceId;
pub use self::user::{
    DisplayName, EmailAddress, PasswordHash, Role, User, UserId, UserParts, UserValidationError,
};
pub use self::user_admin_service::UserAdminService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use helpdesk::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
