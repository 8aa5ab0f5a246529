//! Ticket handlers.
//!
//! ```text
//! POST  /api/v1/tickets                  {"title":"...","description":"...","priority":"alta","category":"red"}
//! GET   /api/v1/tickets?status=abierto&assignedTo={userId}
//! GET   /api/v1/tickets/{id}
//! PATCH /api/v1/tickets/{id}             {"title":"..."}
//! PATCH /api/v1/tickets/{id}/status      {"status":"cerrado"}
//! PATCH /api/v1/tickets/{id}/assign      {"technicianId":"..."} or {"technicianId":null}
//! PATCH /api/v1/tickets/{id}/assign-self
//! ```
//!
//! Handlers only translate payloads; visibility, permissions and the state
//! machine live behind the ticket ports.

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::TicketFilter;
use crate::domain::{
    NewTicket, Ticket, TicketCategory, TicketDescription, TicketEdit, TicketId, TicketPriority,
    TicketStatus, TicketTitle,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_ticket_id, parse_user_id, ticket_field_error,
};

const TICKET_ID: FieldName = FieldName::new("id");
const TECHNICIAN_ID: FieldName = FieldName::new("technicianId");
const ASSIGNED_TO: FieldName = FieldName::new("assignedTo");

/// Body for `POST /api/v1/tickets`. Priority defaults to `media` and
/// category to `otro`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[schema(example = "Printer jams on every job")]
    pub title: String,
    pub description: String,
    #[serde(default)]
    #[schema(example = "alta")]
    pub priority: Option<String>,
    #[serde(default)]
    #[schema(example = "impresoras")]
    pub category: Option<String>,
}

/// Partial content edit for `PATCH /api/v1/tickets/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChangeStatusRequest {
    #[schema(example = "en_progreso")]
    pub status: String,
}

/// Body for `PATCH /api/v1/tickets/{id}/assign`. `null` unassigns.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[serde(default)]
    pub technician_id: Option<String>,
}

/// Query filters for `GET /api/v1/tickets`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TicketListQuery {
    /// Only tickets in this status.
    pub status: Option<String>,
    /// Only tickets assigned to this user id.
    pub assigned_to: Option<String>,
}

/// Ticket as returned by the API.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    #[schema(value_type = String, example = "abierto")]
    pub status: TicketStatus,
    #[schema(value_type = String, example = "media")]
    pub priority: TicketPriority,
    #[schema(value_type = String, example = "otro")]
    pub category: TicketCategory,
    pub creator_id: String,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency revision, bumped on every change.
    pub revision: u32,
}

impl From<&Ticket> for TicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id().to_string(),
            title: ticket.title().as_ref().to_owned(),
            description: ticket.description().as_ref().to_owned(),
            status: ticket.status(),
            priority: ticket.priority(),
            category: ticket.category(),
            creator_id: ticket.creator_id().to_string(),
            assigned_to: ticket.assigned_to().map(ToString::to_string),
            created_at: ticket.created_at(),
            updated_at: ticket.updated_at(),
            revision: ticket.revision(),
        }
    }
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self::from(&ticket)
    }
}

fn parse_wire<T>(raw: &str) -> ApiResult<T>
where
    T: std::str::FromStr<Err = crate::domain::TicketValidationError>,
{
    raw.parse().map_err(ticket_field_error)
}

impl TryFrom<CreateTicketRequest> for NewTicket {
    type Error = crate::domain::Error;

    fn try_from(value: CreateTicketRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: TicketTitle::new(&value.title).map_err(ticket_field_error)?,
            description: TicketDescription::new(value.description).map_err(ticket_field_error)?,
            priority: value
                .priority
                .as_deref()
                .map(parse_wire)
                .transpose()?
                .unwrap_or_default(),
            category: value
                .category
                .as_deref()
                .map(parse_wire)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl TryFrom<UpdateTicketRequest> for TicketEdit {
    type Error = crate::domain::Error;

    fn try_from(value: UpdateTicketRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: value
                .title
                .map(TicketTitle::new)
                .transpose()
                .map_err(ticket_field_error)?,
            description: value
                .description
                .map(TicketDescription::new)
                .transpose()
                .map_err(ticket_field_error)?,
            priority: value.priority.as_deref().map(parse_wire).transpose()?,
            category: value.category.as_deref().map(parse_wire).transpose()?,
        })
    }
}

impl TryFrom<TicketListQuery> for TicketFilter {
    type Error = crate::domain::Error;

    fn try_from(value: TicketListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            status: value.status.as_deref().map(parse_wire).transpose()?,
            assigned_to: value
                .assigned_to
                .as_deref()
                .map(|raw| parse_user_id(raw, ASSIGNED_TO))
                .transpose()?,
        })
    }
}

fn ticket_id(path: web::Path<String>) -> ApiResult<TicketId> {
    parse_ticket_id(&path.into_inner(), TICKET_ID)
}

/// Open a ticket owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<CreateTicketRequest>,
) -> ApiResult<HttpResponse> {
    let new_ticket = NewTicket::try_from(payload.into_inner())?;
    let ticket = state
        .tickets
        .create_ticket(caller.identity(), new_ticket)
        .await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(ticket)))
}

/// Tickets visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(TicketListQuery),
    responses(
        (status = 200, description = "Tickets", body = [TicketResponse]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    caller: Caller,
    query: web::Query<TicketListQuery>,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let filter = TicketFilter::try_from(query.into_inner())?;
    let tickets = state
        .tickets_query
        .list_tickets(caller.identity(), filter)
        .await?;
    Ok(web::Json(tickets.iter().map(TicketResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket", body = TicketResponse),
        (status = 403, description = "Not the caller's ticket", body = ErrorSchema),
        (status = 404, description = "Unknown ticket", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket = state
        .tickets_query
        .get_ticket(caller.identity(), ticket_id(path)?)
        .await?;
    Ok(web::Json(ticket.into()))
}

/// Edit title, description, priority or category. Staff only.
#[utoipa::path(
    patch,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Ticket updated", body = TicketResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown ticket", body = ErrorSchema),
        (status = 409, description = "Concurrent update, retry", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "updateTicket"
)]
#[patch("/tickets/{id}")]
pub async fn update_ticket(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<UpdateTicketRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket_id = ticket_id(path)?;
    let edit = TicketEdit::try_from(payload.into_inner())?;
    let ticket = state
        .tickets
        .edit_ticket(caller.identity(), ticket_id, edit)
        .await?;
    Ok(web::Json(ticket.into()))
}

/// Move a ticket between `abierto`, `en_progreso` and `cerrado`. Staff only.
#[utoipa::path(
    patch,
    path = "/api/v1/tickets/{id}/status",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TicketResponse),
        (status = 400, description = "Unknown status", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown ticket", body = ErrorSchema),
        (status = 409, description = "Concurrent update, retry", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "changeTicketStatus"
)]
#[patch("/tickets/{id}/status")]
pub async fn change_status(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<ChangeStatusRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket_id = ticket_id(path)?;
    let ticket = state
        .tickets
        .change_status(caller.identity(), ticket_id, &payload.status)
        .await?;
    Ok(web::Json(ticket.into()))
}

/// Assign a technician, or unassign with `null`. Admin only.
#[utoipa::path(
    patch,
    path = "/api/v1/tickets/{id}/assign",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Assignment changed", body = TicketResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown ticket", body = ErrorSchema),
        (status = 409, description = "Concurrent update, retry", body = ErrorSchema),
        (status = 422, description = "Assignee is not an active technician", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "assignTicket"
)]
#[patch("/tickets/{id}/assign")]
pub async fn assign_ticket(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<AssignRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket_id = ticket_id(path)?;
    let technician_id = payload
        .technician_id
        .as_deref()
        .map(|raw| parse_user_id(raw, TECHNICIAN_ID))
        .transpose()?;
    let ticket = state
        .tickets
        .assign(caller.identity(), ticket_id, technician_id)
        .await?;
    Ok(web::Json(ticket.into()))
}

/// Take an unassigned ticket. Technicians only.
#[utoipa::path(
    patch,
    path = "/api/v1/tickets/{id}/assign-self",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket taken", body = TicketResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown ticket", body = ErrorSchema),
        (status = 409, description = "Lost a race, retry", body = ErrorSchema),
        (status = 422, description = "Ticket already assigned", body = ErrorSchema)
    ),
    tags = ["tickets"],
    operation_id = "selfAssignTicket"
)]
#[patch("/tickets/{id}/assign-self")]
pub async fn self_assign_ticket(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket = state
        .tickets
        .self_assign(caller.identity(), ticket_id(path)?)
        .await?;
    Ok(web::Json(ticket.into()))
}

#[cfg(test)]
#[path = "tickets_tests.rs"]
mod tests;
