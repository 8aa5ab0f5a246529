//! Domain errors rendered as HTTP responses.
//!
//! The status follows the [`ErrorCode`]. Internal failures are logged in full
//! and the client only sees a generic message with the trace id. Retryable
//! failures advertise `Retry-After`.

use actix_web::http::header::RETRY_AFTER;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Seconds a client should wait before retrying a conflict or outage.
pub const RETRY_AFTER_SECONDS: u32 = 1;

const REDACTED_MESSAGE: &str = "Internal server error";

const fn http_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::InvalidOperation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// What the client is allowed to see of `error`.
fn public_view(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    let generic = Error::internal(REDACTED_MESSAGE);
    match error.trace_id() {
        Some(trace_id) => generic.with_trace_id(trace_id.to_owned()),
        None => generic,
    }
}

fn add_diagnostic_headers(builder: &mut HttpResponseBuilder, error: &Error) {
    if let Some(trace_id) = error.trace_id() {
        builder.insert_header((TRACE_ID_HEADER, trace_id.to_owned()));
    }
    if error.code().is_retryable() {
        builder.insert_header((RETRY_AFTER, RETRY_AFTER_SECONDS.to_string()));
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        http_status(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if self.code() == ErrorCode::InternalError {
            error!(
                message = self.message(),
                details = ?self.details(),
                trace_id = ?self.trace_id(),
                "request failed with internal error"
            );
        }
        let mut builder = HttpResponse::build(self.status_code());
        add_diagnostic_headers(&mut builder, self);
        builder.json(public_view(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced in handler");
        Self::internal(REDACTED_MESSAGE)
    }
}
