//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain constructors report typed validation errors; these helpers turn
//! them into `invalid_request` errors with `{field, code}` details.

use serde_json::json;

use crate::domain::{
    CommentId, CommentValidationError, CredentialValidationError, Error, TicketId,
    TicketValidationError, UserId, UserValidationError,
};

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": "invalid_uuid",
    }))
}

pub(crate) fn parse_ticket_id(value: &str, field: FieldName) -> Result<TicketId, Error> {
    value
        .parse()
        .map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_comment_id(value: &str, field: FieldName) -> Result<CommentId, Error> {
    value
        .parse()
        .map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn ticket_field_error(err: TicketValidationError) -> Error {
    field_error(err.field(), err.code(), err.to_string())
}

pub(crate) fn user_field_error(field: FieldName, err: UserValidationError) -> Error {
    field_error(field.as_str(), err.code(), err.to_string())
}

pub(crate) fn credential_field_error(err: CredentialValidationError) -> Error {
    let field = match err {
        CredentialValidationError::EmptyEmail => "email",
        CredentialValidationError::EmptyPassword
        | CredentialValidationError::PasswordTooShort { .. }
        | CredentialValidationError::PasswordTooLong { .. } => "password",
    };
    field_error(field, err.code(), err.to_string())
}

pub(crate) fn comment_field_error(err: CommentValidationError) -> Error {
    let field = match err {
        CommentValidationError::InvalidId => "id",
        CommentValidationError::EmptyText | CommentValidationError::TextTooLong { .. } => "text",
    };
    field_error(field, err.code(), err.to_string())
}
