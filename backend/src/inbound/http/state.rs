//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    CommentRepository, IdentityResolver, LoginService, PasswordHasher, TicketCommand,
    TicketComments, TicketQuery, TicketRepository, UserAdministration, UserProfileQuery,
    UserRegistration, UserRepository,
};
use crate::domain::{
    AccountService, CommentService, StorageDeadline, TicketService, UserAdminService,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub identity: Arc<dyn IdentityResolver>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub registration: Arc<dyn UserRegistration>,
    pub users: Arc<dyn UserAdministration>,
    pub tickets: Arc<dyn TicketCommand>,
    pub tickets_query: Arc<dyn TicketQuery>,
    pub comments: Arc<dyn TicketComments>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub identity: Arc<dyn IdentityResolver>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub registration: Arc<dyn UserRegistration>,
    pub users: Arc<dyn UserAdministration>,
    pub tickets: Arc<dyn TicketCommand>,
    pub tickets_query: Arc<dyn TicketQuery>,
    pub comments: Arc<dyn TicketComments>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            identity,
            profile,
            registration,
            users,
            tickets,
            tickets_query,
            comments,
        } = ports;
        Self {
            login,
            identity,
            profile,
            registration,
            users,
            tickets,
            tickets_query,
            comments,
        }
    }
}

/// Driven adapters the domain services are built from.
///
/// Both the in-memory store and the Diesel repositories go through here,
/// so the HTTP surface is identical whichever backend is configured.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use helpdesk::domain::StorageDeadline;
/// use helpdesk::inbound::http::state::DrivenAdapters;
/// use helpdesk::outbound::memory::InMemoryStore;
/// use helpdesk::outbound::security::{Argon2PasswordHasher, Argon2Settings};
/// use mockable::DefaultClock;
///
/// let store = Arc::new(InMemoryStore::new());
/// let adapters = DrivenAdapters {
///     users: Arc::clone(&store),
///     tickets: Arc::clone(&store),
///     comments: store,
///     hasher: Arc::new(
///         Argon2PasswordHasher::new(Argon2Settings::default()).expect("valid params"),
///     ),
///     clock: Arc::new(DefaultClock),
///     deadline: StorageDeadline::default(),
/// };
/// let state = adapters.into_http_state();
/// let _login = state.login.clone();
/// ```
pub struct DrivenAdapters<U, T, C, H> {
    pub users: Arc<U>,
    pub tickets: Arc<T>,
    pub comments: Arc<C>,
    pub hasher: Arc<H>,
    pub clock: Arc<dyn Clock>,
    pub deadline: StorageDeadline,
}

impl<U, T, C, H> DrivenAdapters<U, T, C, H>
where
    U: UserRepository + 'static,
    T: TicketRepository + 'static,
    C: CommentRepository + 'static,
    H: PasswordHasher + 'static,
{
    /// Account service over these adapters, also used for the bootstrap admin.
    pub fn account_service(&self) -> AccountService<U, H> {
        AccountService::new(
            Arc::clone(&self.users),
            Arc::clone(&self.hasher),
            Arc::clone(&self.clock),
        )
        .with_deadline(self.deadline)
    }

    pub fn into_http_state(self) -> HttpState {
        let accounts = Arc::new(self.account_service());
        let admin = Arc::new(
            UserAdminService::new(
                Arc::clone(&self.users),
                Arc::clone(&self.tickets),
                Arc::clone(&self.hasher),
                Arc::clone(&self.clock),
            )
            .with_deadline(self.deadline),
        );
        let tickets = Arc::new(
            TicketService::new(
                Arc::clone(&self.tickets),
                Arc::clone(&self.users),
                Arc::clone(&self.clock),
            )
            .with_deadline(self.deadline),
        );
        let comments = Arc::new(
            CommentService::new(self.tickets, self.comments, self.clock)
                .with_deadline(self.deadline),
        );
        HttpState::new(HttpStatePorts {
            login: accounts.clone(),
            identity: accounts.clone(),
            profile: accounts.clone(),
            registration: accounts,
            users: admin,
            tickets: tickets.clone(),
            tickets_query: tickets,
            comments,
        })
    }
}
