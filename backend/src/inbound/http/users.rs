//! Account handlers: session login/logout, self-registration, the caller's
//! profile and the admin user surface.
//!
//! ```text
//! POST   /api/v1/login           {"email":"ana@example.com","password":"..."}
//! POST   /api/v1/logout
//! POST   /api/v1/register        {"email":"...","password":"...","displayName":"Ana"}
//! GET    /api/v1/users/me
//! GET    /api/v1/users
//! POST   /api/v1/users           {"email":"...","password":"...","displayName":"...","role":"tecnico"}
//! PATCH  /api/v1/users/{id}      {"displayName":"...","email":"...","role":"..."}
//! PATCH  /api/v1/users/{id}/active {"active":false}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{NewUserRequest, RegistrationRequest, UserUpdate};
use crate::domain::{DisplayName, EmailAddress, LoginCredentials, NewPassword, Role, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, credential_field_error, parse_user_id, user_field_error,
};

const EMAIL: FieldName = FieldName::new("email");
const DISPLAY_NAME: FieldName = FieldName::new("displayName");
const ROLE: FieldName = FieldName::new("role");
const USER_ID: FieldName = FieldName::new("id");

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ana@example.com")]
    pub email: String,
    pub password: String,
}

/// Self-registration body for `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[schema(example = "Ana Torres")]
    pub display_name: String,
}

/// Admin account creation body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[schema(example = "tecnico")]
    pub role: String,
}

/// Partial account edit for `PATCH /api/v1/users/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Activation toggle for `PATCH /api/v1/users/{id}/active`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// Account as returned by the API. The password hash never leaves the
/// domain.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[schema(value_type = String, example = "usuario")]
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            display_name: user.display_name().to_string(),
            role: user.role(),
            active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

fn parse_email(raw: &str) -> ApiResult<EmailAddress> {
    EmailAddress::new(raw).map_err(|err| user_field_error(EMAIL, err))
}

fn parse_display_name(raw: &str) -> ApiResult<DisplayName> {
    DisplayName::new(raw).map_err(|err| user_field_error(DISPLAY_NAME, err))
}

fn parse_role(raw: &str) -> ApiResult<Role> {
    raw.parse().map_err(|err| user_field_error(ROLE, err))
}

fn parse_password(raw: &str) -> ApiResult<NewPassword> {
    NewPassword::new(raw).map_err(credential_field_error)
}

impl TryFrom<RegisterRequest> for RegistrationRequest {
    type Error = crate::domain::Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: parse_email(&value.email)?,
            password: parse_password(&value.password)?,
            display_name: parse_display_name(&value.display_name)?,
        })
    }
}

impl TryFrom<CreateUserRequest> for NewUserRequest {
    type Error = crate::domain::Error;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: parse_email(&value.email)?,
            password: parse_password(&value.password)?,
            display_name: parse_display_name(&value.display_name)?,
            role: parse_role(&value.role)?,
        })
    }
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = crate::domain::Error;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            display_name: value
                .display_name
                .as_deref()
                .map(parse_display_name)
                .transpose()?,
            email: value.email.as_deref().map(parse_email).transpose()?,
            role: value.role.as_deref().map(parse_role).transpose()?,
        })
    }
}

/// Authenticate and establish a session.
///
/// Unknown email, wrong password and deactivated accounts all answer with
/// the same `401`.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(credential_field_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.sign_in(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// Drop the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.sign_out();
    HttpResponse::NoContent().finish()
}

/// Create an active end-user account.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 422, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = RegistrationRequest::try_from(payload.into_inner())?;
    let user = state.registration.register(request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// The caller's own account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.profile.fetch_profile(caller.identity()).await?;
    Ok(web::Json(user.into()))
}

/// All accounts, oldest first. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let users = state.users.list_users(caller.identity()).await?;
    Ok(web::Json(users.iter().map(UserResponse::from).collect()))
}

/// Create an account with any role. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 422, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let request = NewUserRequest::try_from(payload.into_inner())?;
    let user = state.users.create_user(caller.identity(), request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Change display name, email or role. Admin only.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema),
        (status = 422, description = "Technician still has assigned tickets", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let update = UserUpdate::try_from(payload.into_inner())?;
    let user = state
        .users
        .update_user(caller.identity(), &user_id, update)
        .await?;
    Ok(web::Json(user.into()))
}

/// Activate or deactivate an account. Admin only, never on oneself.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/active",
    params(("id" = String, Path, description = "User id")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Activation changed", body = UserResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "setUserActive"
)]
#[patch("/users/{id}/active")]
pub async fn set_user_active(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<SetActiveRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let user = state
        .users
        .set_active(caller.identity(), &user_id, payload.active)
        .await?;
    Ok(web::Json(user.into()))
}

/// Delete an account that no ticket or comment references. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema),
        (status = 422, description = "Account still referenced", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    state.users.delete_user(caller.identity(), &user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
