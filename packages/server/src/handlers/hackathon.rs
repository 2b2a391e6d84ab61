use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use super::auth::conflict_on_unique;
use crate::entity::{hackathon, register, user_email};
use crate::error::{AppError, ErrorEnvelope};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{PERM_HACKATHON_CREATE, PERM_HACKATHON_MANAGE};
use crate::models::hackathon::*;
use crate::models::shared::{PageQuery, Pagination};
use crate::state::AppState;
use crate::utils::email::{normalize_email, validate_email};

const ALREADY_REGISTERED: &str = "Email is already registered for this hackathon";

#[utoipa::path(
    post,
    path = "/hackathon",
    tag = "Hackathons",
    operation_id = "createHackathon",
    summary = "Create a hackathon",
    description = "Requires `hackathon:create` permission.",
    request_body = CreateHackathonRequest,
    responses(
        (status = 201, description = "Hackathon created", body = HackathonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_hackathon(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateHackathonRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERM_HACKATHON_CREATE)?;
    validate_create_hackathon(&payload)?;

    let now = chrono::Utc::now();
    let new_hackathon = hackathon::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        display_name: Set(payload.display_name.trim().to_string()),
        description: Set(payload.description),
        creator_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_hackathon
        .insert(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, "A hackathon with this name already exists"))?;

    Ok((StatusCode::CREATED, Json(HackathonResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/hackathons",
    tag = "Hackathons",
    operation_id = "listHackathons",
    summary = "List hackathons",
    description = "Paginated list, newest first, with optional case-insensitive search on the name.",
    params(PageQuery),
    responses(
        (status = 200, description = "Hackathons", body = HackathonListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_hackathons(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<HackathonListResponse>, AppError> {
    let (page, per_page) = query.bounds();

    let mut select = hackathon::Entity::find();
    if let Some(pattern) = query.like_pattern() {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(hackathon::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_desc(hackathon::Column::CreatedAt)
        .order_by_desc(hackathon::Column::Id)
        .select_only()
        .column(hackathon::Column::Id)
        .column(hackathon::Column::Name)
        .column(hackathon::Column::DisplayName)
        .column(hackathon::Column::CreatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .into_model::<HackathonListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(HackathonListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/hackathon/{id}",
    tag = "Hackathons",
    operation_id = "getHackathon",
    summary = "Get a hackathon by ID",
    params(("id" = i32, Path, description = "Hackathon ID")),
    responses(
        (status = 200, description = "Hackathon", body = HackathonResponse),
        (status = 404, description = "Hackathon not found (NOT_FOUND)", body = ErrorEnvelope),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_hackathon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<HackathonResponse>, AppError> {
    let model = state
        .hackathons
        .get_hackathon_by_id(id)
        .await?
        .ok_or_else(hackathon_not_found)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/hackathon/name/{name}",
    tag = "Hackathons",
    operation_id = "getHackathonByName",
    summary = "Get a hackathon by its unique name",
    params(("name" = String, Path, description = "Hackathon name")),
    responses(
        (status = 200, description = "Hackathon", body = HackathonResponse),
        (status = 404, description = "Hackathon not found (NOT_FOUND)", body = ErrorEnvelope),
    ),
)]
#[instrument(skip(state), fields(name))]
pub async fn get_hackathon_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<HackathonResponse>, AppError> {
    let model = state
        .hackathons
        .get_hackathon_by_name(name.trim())
        .await?
        .ok_or_else(hackathon_not_found)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/hackathon/{id}",
    tag = "Hackathons",
    operation_id = "updateHackathon",
    summary = "Update a hackathon",
    description = "Changes `display_name` and/or `description`; omitted fields are kept. Allowed for the creator and for holders of `hackathon:manage`.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    request_body = UpdateHackathonRequest,
    responses(
        (status = 200, description = "Hackathon updated", body = HackathonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
        (status = 404, description = "Hackathon not found (NOT_FOUND)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_hackathon(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateHackathonRequest>,
) -> Result<Json<HackathonResponse>, AppError> {
    validate_update_hackathon(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_hackathon(&txn, id).await?;
    auth_user.require_owner_or(existing.creator_id, PERM_HACKATHON_MANAGE)?;

    let mut active: hackathon::ActiveModel = existing.into();
    if let Some(display_name) = payload.display_name {
        active.display_name = Set(display_name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/hackathon/{id}",
    tag = "Hackathons",
    operation_id = "deleteHackathon",
    summary = "Delete a hackathon",
    description = "Removes the hackathon together with all of its registrations. Allowed for the creator and for holders of `hackathon:manage`. Deleting an unknown id succeeds.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    responses(
        (status = 204, description = "Hackathon deleted or absent"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_hackathon(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let Some(existing) = hackathon::Entity::find_by_id(id).one(&txn).await? else {
        return Ok(StatusCode::NO_CONTENT);
    };
    auth_user.require_owner_or(existing.creator_id, PERM_HACKATHON_MANAGE)?;

    let removed = register::Entity::delete_many()
        .filter(register::Column::HackathonId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    hackathon::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(registrations = removed, "Hackathon deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/hackathon/checkNameAvailability",
    tag = "Hackathons",
    operation_id = "checkHackathonNameAvailability",
    summary = "Check whether a hackathon name can be used",
    description = "A name is unavailable when it breaks the naming rules (`Invalid`) or is already taken (`AlreadyExists`).",
    request_body = NameAvailabilityRequest,
    responses(
        (status = 200, description = "Availability", body = NameAvailabilityResponse),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(name = %payload.name))]
pub async fn check_name_availability(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<NameAvailabilityRequest>,
) -> Result<Json<NameAvailabilityResponse>, AppError> {
    let name = payload.name.trim().to_string();
    if let Err(AppError::Validation(message)) = validate_hackathon_name(&name) {
        return Ok(Json(NameAvailabilityResponse::unavailable(
            name,
            NameUnavailableReason::Invalid,
            message,
        )));
    }

    if state.hackathons.get_hackathon_by_name(&name).await?.is_some() {
        return Ok(Json(NameAvailabilityResponse::unavailable(
            name,
            NameUnavailableReason::AlreadyExists,
            "A hackathon with this name already exists".into(),
        )));
    }

    Ok(Json(NameAvailabilityResponse::available(name)))
}

#[utoipa::path(
    get,
    path = "/hackathon/{id}/stat",
    tag = "Hackathons",
    operation_id = "getHackathonStat",
    summary = "Attendance statistics",
    description = "Counts enabled registrations (`total`) and splits them into `online` (email linked to an existing account) and `offline` (`total - online`). A hackathon without registrations reports zeros.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    responses(
        (status = 200, description = "Statistics", body = HackathonStat),
        (status = 404, description = "Hackathon not found (NOT_FOUND)", body = ErrorEnvelope),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_hackathon_stat(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<HackathonStat>, AppError> {
    state
        .hackathons
        .get_hackathon_by_id(id)
        .await?
        .ok_or_else(hackathon_not_found)?;

    let stat = state.hackathons.get_hackathon_stat(id).await?;
    Ok(Json(stat))
}

#[utoipa::path(
    post,
    path = "/hackathon/{id}/registers",
    tag = "Registrations",
    operation_id = "createRegister",
    summary = "Register an email for a hackathon",
    description = "Without `email`, registers the caller's primary email. The caller may also register any email attached to their account. Registering other emails (offline contestants) requires `hackathon:manage`. Returns 409 if the email already has an enabled registration.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    request_body = CreateRegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
        (status = 404, description = "Hackathon not found (NOT_FOUND)", body = ErrorEnvelope),
        (status = 409, description = "Already registered (CONFLICT)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(hackathon_id))]
pub async fn create_register(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(hackathon_id): Path<i32>,
    AppJson(payload): AppJson<CreateRegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_hackathon(&txn, hackathon_id).await?;

    let email = match payload.email {
        None => user_email::Entity::find()
            .filter(user_email::Column::UserId.eq(auth_user.user_id))
            .filter(user_email::Column::PrimaryEmail.eq(true))
            .one(&txn)
            .await?
            .map(|ue| ue.email)
            .ok_or_else(|| AppError::Validation("Account has no primary email".into()))?,
        Some(raw) => {
            let email = normalize_email(&raw);
            validate_email(&email)?;
            let owned = user_email::Entity::find()
                .filter(user_email::Column::UserId.eq(auth_user.user_id))
                .filter(user_email::Column::Email.eq(&email))
                .one(&txn)
                .await?
                .is_some();
            if !owned {
                auth_user.require_permission(PERM_HACKATHON_MANAGE)?;
            }
            email
        }
    };

    ensure_not_registered(&txn, hackathon_id, &email).await?;

    let model = register::ActiveModel {
        hackathon_id: Set(hackathon_id),
        email: Set(email),
        enabled: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| conflict_on_unique(e, ALREADY_REGISTERED))?;
    txn.commit().await?;

    tracing::info!(register_id = model.id, "Registration created");
    Ok((StatusCode::CREATED, Json(RegisterResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/hackathon/{id}/registers",
    tag = "Registrations",
    operation_id = "listRegisters",
    summary = "List registrations of a hackathon",
    description = "All rows, enabled or not, in creation order. Requires `hackathon:manage` permission.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    responses(
        (status = 200, description = "Registrations", body = Vec<RegisterResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
        (status = 404, description = "Hackathon not found (NOT_FOUND)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(hackathon_id))]
pub async fn list_registers(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(hackathon_id): Path<i32>,
) -> Result<Json<Vec<RegisterResponse>>, AppError> {
    auth_user.require_permission(PERM_HACKATHON_MANAGE)?;
    find_hackathon(&state.db, hackathon_id).await?;

    let rows = register::Entity::find()
        .filter(register::Column::HackathonId.eq(hackathon_id))
        .order_by_asc(register::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/hackathon/{id}/registers/{register_id}",
    tag = "Registrations",
    operation_id = "updateRegister",
    summary = "Enable or disable a registration",
    description = "Disabled registrations are excluded from statistics. Requires `hackathon:manage` permission. Re-enabling returns 409 if the email already has another enabled registration.",
    params(
        ("id" = i32, Path, description = "Hackathon ID"),
        ("register_id" = i32, Path, description = "Registration ID"),
    ),
    request_body = UpdateRegisterRequest,
    responses(
        (status = 200, description = "Registration updated", body = RegisterResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorEnvelope),
        (status = 409, description = "Email already registered (CONFLICT)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(hackathon_id, register_id))]
pub async fn update_register(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((hackathon_id, register_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateRegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    auth_user.require_permission(PERM_HACKATHON_MANAGE)?;

    let txn = state.db.begin().await?;
    let existing = register::Entity::find_by_id(register_id)
        .filter(register::Column::HackathonId.eq(hackathon_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found".into()))?;

    if existing.enabled == payload.enabled {
        return Ok(Json(existing.into()));
    }
    if payload.enabled {
        ensure_not_registered(&txn, hackathon_id, &existing.email).await?;
    }

    let mut active: register::ActiveModel = existing.into();
    active.enabled = Set(payload.enabled);
    let model = active
        .update(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, ALREADY_REGISTERED))?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

fn hackathon_not_found() -> AppError {
    AppError::NotFound("Hackathon not found".into())
}

async fn find_hackathon<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<hackathon::Model, AppError> {
    hackathon::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(hackathon_not_found)
}

async fn ensure_not_registered<C: ConnectionTrait>(
    db: &C,
    hackathon_id: i32,
    email: &str,
) -> Result<(), AppError> {
    let exists = register::Entity::find()
        .filter(register::Column::HackathonId.eq(hackathon_id))
        .filter(register::Column::Email.eq(email))
        .filter(register::Column::Enabled.eq(true))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Err(AppError::Conflict(ALREADY_REGISTERED.into()));
    }
    Ok(())
}
