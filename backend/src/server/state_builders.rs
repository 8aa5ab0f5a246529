//! Builders for the HTTP state from the configured storage backend.

use std::sync::Arc;

use helpdesk::domain::ports::{
    CommentRepository, PasswordHasher, PasswordHasherError, TicketRepository, UserRepository,
};
use helpdesk::domain::{EmailAddress, NewPassword, StorageDeadline};
use helpdesk::inbound::http::state::{DrivenAdapters, HttpState};
use helpdesk::outbound::memory::InMemoryStore;
use helpdesk::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselTicketRepository, DieselUserRepository,
};
use helpdesk::outbound::security::{Argon2PasswordHasher, Argon2Settings};
use mockable::{Clock, DefaultClock};
use tracing::info;

/// Failure while assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateBuildError {
    #[error("password hasher could not be configured: {0}")]
    Hasher(#[from] PasswordHasherError),
    #[error("bootstrap admin is invalid: {0}")]
    InvalidBootstrapAdmin(String),
    #[error("bootstrap admin could not be created: {0}")]
    Bootstrap(String),
}

/// Validated credentials for the admin account created at startup.
#[derive(Debug)]
pub struct BootstrapAdmin {
    email: EmailAddress,
    password: NewPassword,
}

impl BootstrapAdmin {
    pub fn parse(email: &str, password: &str) -> Result<Self, StateBuildError> {
        let email = EmailAddress::new(email)
            .map_err(|err| StateBuildError::InvalidBootstrapAdmin(err.to_string()))?;
        let password = NewPassword::new(password)
            .map_err(|err| StateBuildError::InvalidBootstrapAdmin(err.to_string()))?;
        Ok(Self { email, password })
    }
}

/// Inputs for [`build_http_state`].
pub struct StateOptions {
    pub db_pool: Option<DbPool>,
    pub deadline: StorageDeadline,
    pub argon2: Argon2Settings,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Wire the services over PostgreSQL when a pool is present, otherwise over
/// the in-memory store, then create the bootstrap admin if requested.
pub async fn build_http_state(options: StateOptions) -> Result<HttpState, StateBuildError> {
    let StateOptions {
        db_pool,
        deadline,
        argon2,
        bootstrap_admin,
    } = options;
    let hasher = Arc::new(Argon2PasswordHasher::new(argon2)?);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    match db_pool {
        Some(pool) => {
            info!("using PostgreSQL storage");
            let adapters = DrivenAdapters {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                tickets: Arc::new(DieselTicketRepository::new(pool.clone())),
                comments: Arc::new(DieselCommentRepository::new(pool)),
                hasher,
                clock,
                deadline,
            };
            finish(adapters, bootstrap_admin).await
        }
        None => {
            info!("no database configured; using in-memory storage");
            let store = Arc::new(InMemoryStore::new());
            let adapters = DrivenAdapters {
                users: Arc::clone(&store),
                tickets: Arc::clone(&store),
                comments: store,
                hasher,
                clock,
                deadline,
            };
            finish(adapters, bootstrap_admin).await
        }
    }
}

async fn finish<U, T, C, H>(
    adapters: DrivenAdapters<U, T, C, H>,
    bootstrap_admin: Option<BootstrapAdmin>,
) -> Result<HttpState, StateBuildError>
where
    U: UserRepository + 'static,
    T: TicketRepository + 'static,
    C: CommentRepository + 'static,
    H: PasswordHasher + 'static,
{
    if let Some(BootstrapAdmin { email, password }) = bootstrap_admin {
        let created = adapters
            .account_service()
            .ensure_admin(email, &password)
            .await
            .map_err(|err| StateBuildError::Bootstrap(err.to_string()))?;
        if let Some(admin) = created {
            info!(user_id = %admin.id(), "bootstrap admin created");
        }
    }
    Ok(adapters.into_http_state())
}
