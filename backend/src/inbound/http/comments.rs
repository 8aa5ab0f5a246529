//! Comment handlers.
//!
//! ```text
//! GET    /api/v1/tickets/{id}/comments
//! POST   /api/v1/tickets/{id}/comments {"text":"..."}
//! DELETE /api/v1/comments/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Comment;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_comment_id, parse_ticket_id};

const ID: FieldName = FieldName::new("id");

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    #[schema(example = "Replaced the toner, please retry.")]
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub ticket_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Comment> for CommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            ticket_id: comment.ticket_id.to_string(),
            user_id: comment.user_id.to_string(),
            text: comment.text.as_ref().to_owned(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Comments on a ticket the caller may see, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}/comments",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Comments", body = [CommentResponse]),
        (status = 403, description = "Not the caller's ticket", body = ErrorSchema),
        (status = 404, description = "Unknown ticket", body = ErrorSchema)
    ),
    tags = ["comments"],
    operation_id = "listComments"
)]
#[get("/tickets/{id}/comments")]
pub async fn list_comments(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CommentResponse>>> {
    let ticket_id = parse_ticket_id(&path.into_inner(), ID)?;
    let comments = state
        .comments
        .list_comments(caller.identity(), ticket_id)
        .await?;
    Ok(web::Json(comments.iter().map(CommentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/comments",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Invalid text", body = ErrorSchema),
        (status = 403, description = "Not the caller's ticket", body = ErrorSchema),
        (status = 404, description = "Unknown ticket", body = ErrorSchema)
    ),
    tags = ["comments"],
    operation_id = "addComment"
)]
#[post("/tickets/{id}/comments")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let ticket_id = parse_ticket_id(&path.into_inner(), ID)?;
    let comment = state
        .comments
        .add_comment(caller.identity(), ticket_id, &payload.text)
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(&comment)))
}

/// Remove a comment. Allowed for its author and for admins.
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the author", body = ErrorSchema),
        (status = 404, description = "Unknown comment", body = ErrorSchema)
    ),
    tags = ["comments"],
    operation_id = "deleteComment"
)]
#[delete("/comments/{id}")]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let comment_id = parse_comment_id(&path.into_inner(), ID)?;
    state
        .comments
        .delete_comment(caller.identity(), comment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
