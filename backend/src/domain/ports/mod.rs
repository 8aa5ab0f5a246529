//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, password hashing) expose typed errors built
//! with `define_port_error!` so adapters map their failures into predictable
//! variants. Driving ports (use-cases) return the domain [`Error`](crate::domain::Error)
//! and are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod comment_repository;
mod identity_resolver;
mod login_service;
mod password_hasher;
mod ticket_command;
mod ticket_comments;
mod ticket_query;
mod ticket_repository;
mod user_administration;
mod user_profile_query;
mod user_registration;
mod user_repository;

#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentRepository, CommentRepositoryError};
pub use identity_resolver::IdentityResolver;
pub use login_service::LoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
pub use ticket_command::TicketCommand;
pub use ticket_comments::TicketComments;
pub use ticket_query::TicketQuery;
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{TicketFilter, TicketRepository, TicketRepositoryError};
pub use user_administration::{NewUserRequest, UserAdministration, UserUpdate};
pub use user_profile_query::UserProfileQuery;
pub use user_registration::{RegistrationRequest, UserRegistration};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
