//! Caller identity extraction.
//!
//! Every ticket and account handler takes a [`Caller`]. The extractor reads
//! the user id from the session cookie and resolves it through the
//! [`IdentityResolver`](crate::domain::ports::IdentityResolver) port, so role
//! and active flag are always current. Requests without a resolvable
//! identity fail with `401` before any policy check runs, and a session
//! naming an unknown or deactivated account is purged.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, ErrorCode, Identity};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Resolved identity of the current request's caller.
#[derive(Debug, Clone)]
pub struct Caller(Identity);

impl Caller {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered with the app"))?;
            let session = SessionContext::new(session.await?);
            let user_id = session.require_signed_in()?;
            match state.identity.resolve(&user_id).await {
                Ok(identity) => Ok(Self(identity)),
                Err(error) => {
                    if error.code() == ErrorCode::Unauthorized {
                        debug!(user_id = %user_id, "session no longer names an active account");
                        session.sign_out();
                    }
                    Err(error)
                }
            }
        })
    }
}
