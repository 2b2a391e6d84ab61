use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{user, user_email};
use crate::error::{AppError, ErrorEnvelope};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AddEmailRequest, LoginRequest, LoginResponse, MeResponse, SignupRequest, SignupResponse,
    UserEmailResponse, permissions_for_role, validate_account_name, validate_login_request,
    validate_password,
};
use crate::state::AppState;
use crate::utils::email::{normalize_email, validate_email};
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/user/signup",
    tag = "Users",
    operation_id = "signup",
    summary = "Create an account",
    description = "Creates an account together with its primary email. Registrations made with that email count as online in hackathon statistics.",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 409, description = "Name or email already taken (CONFLICT)", body = ErrorEnvelope),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_account_name(&payload.name)?;
    validate_password(&payload.password)?;
    let email = normalize_email(&payload.email);
    validate_email(&email)?;

    let name = payload.name.trim().to_string();
    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
    let now = chrono::Utc::now();

    let txn = state.db.begin().await?;

    let new_user = user::ActiveModel {
        name: Set(name),
        password: Set(hash),
        role: Set(user::DEFAULT_ROLE.to_string()),
        created_at: Set(now),
        ..Default::default()
    };
    let user = new_user
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Name is already taken"))?;

    let primary = user_email::ActiveModel {
        user_id: Set(user.id),
        email: Set(email),
        primary_email: Set(true),
        created_at: Set(now),
        ..Default::default()
    };
    let primary = primary
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Email is already in use"))?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            name: user.name,
            email: primary.email,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/user/login",
    tag = "Users",
    operation_id = "login",
    summary = "Log in and obtain a bearer token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Wrong name or password (INVALID_CREDENTIALS)", body = ErrorEnvelope),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Name.eq(payload.name.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let auth = &state.config.auth;
    let token = jwt::sign(
        user.id,
        &user.name,
        &user.role,
        &auth.jwt_secret,
        auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        permissions: permissions_for_role(&user.role),
        name: user.name,
        role: user.role,
    }))
}

#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "Signed-in user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(auth_user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: auth_user.user_id,
        name: auth_user.name,
        role: auth_user.role,
        permissions: auth_user.permissions,
    })
}

#[utoipa::path(
    post,
    path = "/user/emails",
    tag = "Users",
    operation_id = "addEmail",
    summary = "Attach another email to the signed-in account",
    request_body = AddEmailRequest,
    responses(
        (status = 201, description = "Email attached", body = UserEmailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 409, description = "Email already in use (CONFLICT)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_email(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AddEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);
    validate_email(&email)?;

    let model = user_email::ActiveModel {
        user_id: Set(auth_user.user_id),
        email: Set(email),
        primary_email: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "Email is already in use"))?;

    Ok((StatusCode::CREATED, Json(UserEmailResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/user/emails",
    tag = "Users",
    operation_id = "listEmails",
    summary = "List the signed-in account's emails",
    responses(
        (status = 200, description = "Emails, primary first", body = Vec<UserEmailResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_emails(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserEmailResponse>>, AppError> {
    let rows = user_email::Entity::find()
        .filter(user_email::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(user_email::Column::PrimaryEmail)
        .order_by_asc(user_email::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Map a unique-constraint violation to 409, anything else to 500.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Unique constraint caught on insert: {message}");
            AppError::Conflict(message.to_string())
        }
        _ => AppError::from(err),
    }
}
