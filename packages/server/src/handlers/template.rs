use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use super::auth::conflict_on_unique;
use crate::entity::template;
use crate::error::{AppError, ErrorEnvelope};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::PERM_TEMPLATE_MANAGE;
use crate::models::shared::Pagination;
use crate::models::template::*;
use crate::state::AppState;

const DUPLICATE_NAME: &str = "A template with this name already exists";

#[utoipa::path(
    post,
    path = "/template",
    tag = "Templates",
    operation_id = "createTemplate",
    summary = "Create a template",
    description = "Stores a virtual-environment template. `virtual_environment.provider` selects the variant: `docker` needs `image`, `k8s` needs `yaml_template` (a manifest with apiVersion, kind and metadata.name).",
    request_body = TemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Malformed or invalid payload (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_template(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TemplateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = insert_template(&state.db, auth_user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse::try_from(model)?)))
}

#[utoipa::path(
    post,
    path = "/template/file",
    tag = "Templates",
    operation_id = "createTemplateFromFile",
    summary = "Create a template from an uploaded file",
    description = "Accepts a multipart form whose `file` field holds a JSON or YAML document shaped like the body of createTemplate.",
    request_body(content_type = "multipart/form-data", description = "JSON or YAML template document in field `file`"),
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Missing, unreadable or invalid document (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_template_from_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_bytes = state.config.template.max_upload_bytes;

    let mut document: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            document = Some(data.to_vec());
            break;
        }
    }

    let document = document.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    if document.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "Template file exceeds {max_bytes} bytes"
        )));
    }

    let payload = parse_template_document(&document)?;
    let model = insert_template(&state.db, auth_user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse::try_from(model)?)))
}

/// Multipart framing overhead on top of the configured document limit.
pub fn upload_body_limit(max_upload_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_bytes + 16 * 1024)
}

#[utoipa::path(
    get,
    path = "/template/{id}",
    tag = "Templates",
    operation_id = "getTemplate",
    summary = "Get a template by ID",
    params(("id" = i32, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template", body = TemplateResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 404, description = "Template not found (NOT_FOUND)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_template(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TemplateResponse>, AppError> {
    let model = find_template(&state.db, id).await?;
    Ok(Json(TemplateResponse::try_from(model)?))
}

#[utoipa::path(
    put,
    path = "/template/{id}",
    tag = "Templates",
    operation_id = "updateTemplate",
    summary = "Replace a template",
    description = "Replaces name, description and virtual environment. Allowed for the creator and for holders of `template:manage`.",
    params(("id" = i32, Path, description = "Template ID")),
    request_body = TemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = TemplateResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
        (status = 404, description = "Template not found (NOT_FOUND)", body = ErrorEnvelope),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_template(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    validate_template_request(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_template(&txn, id).await?;
    auth_user.require_owner_or(existing.creator_id, PERM_TEMPLATE_MANAGE)?;

    let (provider, image, yaml_template) = payload.virtual_environment.into_columns();
    let mut active: template::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.description = Set(payload.description);
    active.provider = Set(provider);
    active.image = Set(image);
    active.yaml_template = Set(yaml_template);
    active.updated_at = Set(chrono::Utc::now());

    let model = active
        .update(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;
    txn.commit().await?;

    Ok(Json(TemplateResponse::try_from(model)?))
}

#[utoipa::path(
    delete,
    path = "/template/{id}",
    tag = "Templates",
    operation_id = "deleteTemplate",
    summary = "Delete a template",
    description = "Allowed for the creator and for holders of `template:manage`.",
    params(("id" = i32, Path, description = "Template ID")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorEnvelope),
        (status = 404, description = "Template not found (NOT_FOUND)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_template(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_template(&txn, id).await?;
    auth_user.require_owner_or(existing.creator_id, PERM_TEMPLATE_MANAGE)?;

    template::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/templates",
    tag = "Templates",
    operation_id = "listTemplates",
    summary = "List templates",
    description = "Paginated list ordered by name, with optional case-insensitive name search and provider filter.",
    params(TemplateListQuery),
    responses(
        (status = 200, description = "Templates", body = TemplateListResponse),
        (status = 400, description = "Unknown provider (VALIDATION_ERROR)", body = ErrorEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_templates(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TemplateListQuery>,
) -> Result<Json<TemplateListResponse>, AppError> {
    let page_query = query.page_query();
    let (page, per_page) = page_query.bounds();

    let mut select = template::Entity::find();

    if let Some(ref provider) = query.provider {
        let provider = provider.trim().to_lowercase();
        if provider != template::PROVIDER_DOCKER && provider != template::PROVIDER_K8S {
            return Err(AppError::Validation(
                "provider must be one of: docker, k8s".into(),
            ));
        }
        select = select.filter(template::Column::Provider.eq(provider));
    }

    if let Some(pattern) = page_query.like_pattern() {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(template::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let rows = select
        .order_by_asc(template::Column::Name)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .map(TemplateResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(TemplateListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

async fn insert_template<C: ConnectionTrait>(
    db: &C,
    creator_id: i32,
    payload: TemplateRequest,
) -> Result<template::Model, AppError> {
    validate_template_request(&payload)?;

    let (provider, image, yaml_template) = payload.virtual_environment.into_columns();
    let now = chrono::Utc::now();
    let new_template = template::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        provider: Set(provider),
        image: Set(image),
        yaml_template: Set(yaml_template),
        creator_id: Set(creator_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_template
        .insert(db)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;
    tracing::info!(id = model.id, provider = %model.provider, "Template created");
    Ok(model)
}

async fn find_template<C: ConnectionTrait>(db: &C, id: i32) -> Result<template::Model, AppError> {
    template::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".into()))
}
