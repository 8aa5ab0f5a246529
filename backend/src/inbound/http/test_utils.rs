//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use serde_json::json;

use crate::Trace;
use crate::domain::{DisplayName, EmailAddress, NewPassword, Role, StorageDeadline, UserId};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::{DrivenAdapters, HttpState};
use crate::outbound::memory::InMemoryStore;
use crate::outbound::security::{Argon2PasswordHasher, Argon2Settings};

/// Password shared by every seeded account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Cheap Argon2 parameters so login tests stay fast.
pub fn fast_hasher() -> Argon2PasswordHasher {
    Argon2PasswordHasher::new(Argon2Settings {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("test argon2 params are valid")
}

/// In-memory application with one account per role plus a second end user.
pub struct TestApp {
    state: web::Data<HttpState>,
    pub store: Arc<InMemoryStore>,
    pub admin: UserId,
    pub tecnico: UserId,
    pub usuario: UserId,
    pub other_usuario: UserId,
}

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const TECNICO_EMAIL: &str = "luis@example.com";
pub const USUARIO_EMAIL: &str = "ana@example.com";
pub const OTHER_USUARIO_EMAIL: &str = "bea@example.com";

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let adapters = DrivenAdapters {
            users: Arc::clone(&store),
            tickets: Arc::clone(&store),
            comments: Arc::clone(&store),
            hasher: Arc::new(fast_hasher()),
            clock: Arc::new(mockable::DefaultClock),
            deadline: StorageDeadline::default(),
        };
        let accounts = adapters.account_service();
        let password = NewPassword::new(TEST_PASSWORD).expect("valid test password");
        let mut seeded = Vec::new();
        for (email, name, role) in [
            (ADMIN_EMAIL, "Admin", Role::Admin),
            (TECNICO_EMAIL, "Luis", Role::Tecnico),
            (USUARIO_EMAIL, "Ana", Role::Usuario),
            (OTHER_USUARIO_EMAIL, "Bea", Role::Usuario),
        ] {
            let user = accounts
                .create_account(
                    EmailAddress::new(email).expect("valid email"),
                    &password,
                    DisplayName::new(name).expect("valid name"),
                    role,
                )
                .await
                .expect("seed account");
            seeded.push(user.id().clone());
        }
        let [admin, tecnico, usuario, other_usuario] =
            <[UserId; 4]>::try_from(seeded).expect("four seeded accounts");
        Self {
            state: web::Data::new(adapters.into_http_state()),
            store,
            admin,
            tecnico,
            usuario,
            other_usuario,
        }
    }

    pub fn state(&self) -> web::Data<HttpState> {
        self.state.clone()
    }

    /// Seeded account for `role`; end users map to the primary one.
    pub fn user(&self, role: Role) -> UserId {
        match role {
            Role::Admin => self.admin.clone(),
            Role::Tecnico => self.tecnico.clone(),
            Role::Usuario => self.usuario.clone(),
        }
    }

    /// Initialise the full `/api/v1` surface behind the trace and session
    /// middleware.
    pub async fn service(
        &self,
    ) -> impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
    > + use<> {
        test::init_service(
            App::new().app_data(self.state()).wrap(Trace).service(
                web::scope("/api/v1")
                    .wrap(test_session_middleware())
                    .configure(configure_api),
            ),
        )
        .await
    }
}

/// Log in through `POST /api/v1/login` and return the session cookie.
pub async fn login_cookie<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": email, "password": TEST_PASSWORD }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "login failed for {email}");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}
