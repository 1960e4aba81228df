// src/handlers/auth.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{default_page, default_per_page, page_to_limit_offset},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::auth::{LoginPayload, RefreshPayload, RegisterPayload, Role, UpdateUserPayload},
};

// POST /api/auth/login (pública)
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(response))
}

// POST /api/auth/refresh (pública: a credencial é o próprio refresh token)
pub async fn refresh(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state.auth_service.refresh(&payload.refresh_token).await?;
    Ok(Json(response))
}

// POST /api/auth/register — somente Admin cria usuários
pub async fn register(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .auth_service
        .register_user(
            &payload.username,
            &payload.email,
            &payload.password,
            &payload.first_name,
            &payload.last_name,
            payload.role,
            payload.is_active.unwrap_or(true),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/auth/me
pub async fn me(user: AuthenticatedUser) -> impl IntoResponse {
    Json(user.0)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    pub search: Option<String>,
    pub role: Option<Role>,
    #[serde(default = "default_true")]
    pub active_only: bool,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

// GET /api/auth/users — somente Admin
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Query(params): Query<ListUsersParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page_to_limit_offset(params.page, params.per_page);
    let users = app_state
        .auth_service
        .list_users(
            params.search.as_deref(),
            params.role,
            params.active_only,
            limit,
            offset,
        )
        .await?;
    Ok(Json(users))
}

// GET /api/auth/users/{id} — o próprio usuário ou Admin
pub async fn get_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.auth_service.get_user(&user.0, id).await?;
    Ok(Json(found))
}

// PUT /api/auth/users/{id} — o próprio usuário ou Admin
pub async fn update_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let updated = app_state
        .auth_service
        .update_user(&user.0, id, payload)
        .await?;
    Ok(Json(updated))
}

// DELETE /api/auth/users/{id} — exclusão lógica, somente Admin
pub async fn delete_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deactivated = app_state.auth_service.deactivate_user(&user.0, id).await?;
    Ok(Json(deactivated))
}

// GET /api/auth/roles — papéis disponíveis para os formulários de usuário
pub async fn list_roles() -> impl IntoResponse {
    let roles: Vec<_> = Role::ALL
        .iter()
        .map(|role| json!({ "value": role.as_str(), "label": role.label() }))
        .collect();
    Json(roles)
}
