//! In-process application harness shared by the integration suites.
//!
//! The app is assembled from the public library surface over the in-memory
//! store, so suites exercise the same handlers and middleware as the server
//! without a database.

use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key, SameSite, time::Duration as CookieDuration};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::{App, test, web};
use helpdesk::Trace;
use helpdesk::domain::ports::NewUserRequest;
use helpdesk::domain::{
    DisplayName, EmailAddress, NewPassword, Role, StorageDeadline, TRACE_ID_HEADER,
};
use helpdesk::inbound::http::configure_api;
use helpdesk::inbound::http::state::{DrivenAdapters, HttpState};
use helpdesk::outbound::memory::InMemoryStore;
use helpdesk::outbound::security::{Argon2PasswordHasher, Argon2Settings};
use mockable::DefaultClock;
use serde_json::Value;

pub const PASSWORD: &str = "correct-horse-battery";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Response status, trace header and JSON body (`Null` when empty).
pub struct Reply {
    pub status: u16,
    pub trace_id: Option<String>,
    pub body: Value,
}

/// Shared state plus the cookie key, so every app built from one backend
/// accepts the same session cookies.
#[derive(Clone)]
pub struct Backend {
    pub state: web::Data<HttpState>,
    key: Key,
}

fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(CookieDuration::hours(2)))
        .build()
}

impl Backend {
    /// Fresh in-memory backend with a bootstrap admin.
    pub async fn start() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let adapters = DrivenAdapters {
            users: Arc::clone(&store),
            tickets: Arc::clone(&store),
            comments: store,
            hasher: Arc::new(
                Argon2PasswordHasher::new(Argon2Settings {
                    memory_kib: 64,
                    iterations: 1,
                    parallelism: 1,
                })
                .expect("argon2 parameters"),
            ),
            clock: Arc::new(DefaultClock),
            deadline: StorageDeadline::default(),
        };
        adapters
            .account_service()
            .ensure_admin(
                EmailAddress::new(ADMIN_EMAIL).expect("admin email"),
                &NewPassword::new(PASSWORD).expect("admin password"),
            )
            .await
            .expect("bootstrap admin")
            .expect("admin created");
        Self {
            state: web::Data::new(adapters.into_http_state()),
            key: Key::generate(),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new().app_data(self.state.clone()).wrap(Trace).service(
            web::scope("/api/v1")
                .wrap(session_middleware(self.key.clone()))
                .configure(configure_api),
        )
    }

    /// Create an account through the admin port and return its id.
    pub async fn add_user(&self, email: &str, name: &str, role: Role) -> String {
        let credentials =
            helpdesk::domain::LoginCredentials::try_from_parts(ADMIN_EMAIL, PASSWORD)
                .expect("credentials");
        let admin_id = self
            .state
            .login
            .authenticate(&credentials)
            .await
            .expect("admin login");
        let admin = self.state.identity.resolve(&admin_id).await.expect("admin");
        let user = self
            .state
            .users
            .create_user(
                &admin,
                NewUserRequest {
                    email: EmailAddress::new(email).expect("email"),
                    password: NewPassword::new(PASSWORD).expect("password"),
                    display_name: DisplayName::new(name).expect("display name"),
                    role,
                },
            )
            .await
            .expect("user created");
        user.id().to_string()
    }
}

pub async fn send<S, B>(
    app: &S,
    method: Method,
    uri: &str,
    cookie: Option<&Cookie<'static>>,
    body: Option<Value>,
) -> Reply
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut req = test::TestRequest::default().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status().as_u16();
    let trace_id = res
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    Reply {
        status,
        trace_id,
        body,
    }
}

/// Log in and return the session cookie.
pub async fn login<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(serde_json::json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status().as_u16(), 200, "login for {email}");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
