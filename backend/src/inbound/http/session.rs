//! Signed-cookie session holding the signed-in account.
//!
//! The cookie carries only the user id. Role and the active flag are
//! resolved again on every request, so a cookie never outlives an account
//! change.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const SIGNED_IN_KEY: &str = "uid";

fn session_failure(action: &str, error: impl std::fmt::Display) -> Error {
    Error::internal(format!("session {action} failed: {error}"))
}

/// Request-scoped view of the session cookie.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Start a session for `user_id`.
    ///
    /// The cookie is renewed first so a pre-login cookie cannot be reused.
    pub fn sign_in(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(SIGNED_IN_KEY, user_id.as_ref())
            .map_err(|error| session_failure("write", error))
    }

    /// The signed-in user, if any. A value that is not a user id is dropped
    /// along with the rest of the session.
    pub fn signed_in(&self) -> Result<Option<UserId>, Error> {
        let Some(raw) = self
            .0
            .get::<String>(SIGNED_IN_KEY)
            .map_err(|error| session_failure("read", error))?
        else {
            return Ok(None);
        };
        match UserId::new(&raw) {
            Ok(user_id) => Ok(Some(user_id)),
            Err(error) => {
                warn!(%error, "discarding session with malformed user id");
                self.0.purge();
                Ok(None)
            }
        }
    }

    /// The signed-in user or `401 Unauthorized`.
    pub fn require_signed_in(&self) -> Result<UserId, Error> {
        self.signed_in()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// End the session and expire the cookie.
    pub fn sign_out(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { session.await.map(Self::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    use crate::inbound::http::test_utils::test_session_middleware;

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn session_cookie(res: &actix_web::dev::ServiceResponse) -> Option<Cookie<'static>> {
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(Cookie::into_owned)
    }

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let user_id = session.require_signed_in()?;
        Ok(HttpResponse::Ok().body(user_id.to_string()))
    }

    async fn sign_in_fixture(session: SessionContext) -> Result<HttpResponse, Error> {
        let user_id = UserId::new(FIXTURE_ID).map_err(|err| Error::internal(err.to_string()))?;
        session.sign_in(&user_id)?;
        Ok(HttpResponse::NoContent().finish())
    }

    async fn forge(session: Session, raw: web::Path<String>) -> Result<HttpResponse, Error> {
        session
            .insert(SIGNED_IN_KEY, raw.into_inner())
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(HttpResponse::NoContent().finish())
    }

    async fn sign_out(session: SessionContext) -> HttpResponse {
        session.sign_out();
        HttpResponse::NoContent().finish()
    }

    macro_rules! session_app {
        () => {
            test::init_service(
                App::new()
                    .wrap(test_session_middleware())
                    .route("/sign-in", web::post().to(sign_in_fixture))
                    .route("/forge/{raw}", web::post().to(forge))
                    .route("/sign-out", web::post().to(sign_out))
                    .route("/whoami", web::get().to(whoami)),
            )
        };
    }

    #[actix_web::test]
    async fn signed_in_user_survives_the_round_trip() {
        let app = session_app!().await;

        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/sign-in").to_request(),
        )
        .await;
        let cookie = session_cookie(&res).expect("session cookie");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, FIXTURE_ID);
    }

    #[actix_web::test]
    async fn anonymous_request_is_unauthorised() {
        let app = session_app!().await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("42")]
    #[actix_web::test]
    async fn malformed_user_id_is_unauthorised_and_dropped(#[case] raw: &str) {
        let app = session_app!().await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/forge/{raw}"))
                .to_request(),
        )
        .await;
        let cookie = session_cookie(&res).expect("session cookie");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let removal = session_cookie(&res).expect("removal cookie");
        assert_eq!(removal.value(), "");
    }

    #[actix_web::test]
    async fn sign_out_expires_the_cookie() {
        let app = session_app!().await;
        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/sign-in").to_request(),
        )
        .await;
        let cookie = session_cookie(&res).expect("session cookie");

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/sign-out")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let removal = session_cookie(&res).expect("removal cookie");
        assert_eq!(removal.value(), "");
    }
}
