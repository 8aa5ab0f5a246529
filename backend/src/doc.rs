//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler under `inbound::http`, the shared
//! error schemas and the session cookie security scheme. The document backs
//! Swagger UI in debug builds and is exported by the `openapi-dump` binary.

use crate::inbound::http::comments::{CommentResponse, CreateCommentRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::tickets::{
    AssignRequest, ChangeStatusRequest, CreateTicketRequest, TicketResponse, UpdateTicketRequest,
};
use crate::inbound::http::users::{
    CreateUserRequest, LoginRequest, RegisterRequest, SetActiveRequest, UpdateUserRequest,
    UserResponse,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Helpdesk API",
        description = "Support tickets, comments and accounts behind a session cookie."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::register,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::set_user_active,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::update_ticket,
        crate::inbound::http::tickets::change_status,
        crate::inbound::http::tickets::assign_ticket,
        crate::inbound::http::tickets::self_assign_ticket,
        crate::inbound::http::comments::list_comments,
        crate::inbound::http::comments::add_comment,
        crate::inbound::http::comments::delete_comment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        RegisterRequest,
        CreateUserRequest,
        UpdateUserRequest,
        SetActiveRequest,
        UserResponse,
        CreateTicketRequest,
        UpdateTicketRequest,
        ChangeStatusRequest,
        AssignRequest,
        TicketResponse,
        CreateCommentRequest,
        CommentResponse,
    )),
    tags(
        (name = "users", description = "Sessions and accounts"),
        (name = "tickets", description = "Support tickets and their workflow"),
        (name = "comments", description = "Ticket discussion"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/tickets")]
    #[case("/api/v1/tickets/{id}")]
    #[case("/api/v1/tickets/{id}/status")]
    #[case("/api/v1/tickets/{id}/assign")]
    #[case("/api/v1/tickets/{id}/assign-self")]
    #[case("/api/v1/tickets/{id}/comments")]
    #[case("/api/v1/comments/{id}")]
    #[case("/api/v1/users/{id}/active")]
    #[case("/health/ready")]
    fn document_registers_paths(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[test]
    fn ticket_response_exposes_revision() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let ticket = schemas.get("TicketResponse").expect("TicketResponse schema");

        assert_object_schema_has_field(ticket, "revision");
        assert_object_schema_has_field(ticket, "assignedTo");
    }
}
