// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{default_page, default_per_page, page_to_limit_offset},
    middleware::rbac::{AdminOnly, RequireRole, SalesAccess},
    services::customer_service::CustomerDraft,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerPayload {
    pub customer_code: Option<String>,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl CustomerPayload {
    fn into_draft(self) -> (CustomerDraft, Option<bool>) {
        let is_active = self.is_active;
        (
            CustomerDraft {
                customer_code: self.customer_code,
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                phone: self.phone,
                address: self.address,
                date_of_birth: self.date_of_birth,
            },
            is_active,
        )
    }
}

// POST /api/customers
pub async fn create_customer(
    State(app_state): State<AppState>,
    _guard: RequireRole<SalesAccess>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (draft, _) = payload.into_draft();

    let customer = app_state.customer_service.create_customer(draft).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /api/customers/{id}
pub async fn update_customer(
    State(app_state): State<AppState>,
    _guard: RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (draft, is_active) = payload.into_draft();

    let customer = app_state
        .customer_service
        .update_customer(id, draft, is_active)
        .await?;
    Ok(Json(customer))
}

// GET /api/customers/{id} — cliente + extrato recente de pontos
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (customer, transactions) = app_state.customer_service.loyalty_summary(id, 10).await?;
    Ok(Json(json!({
        "customer": customer,
        "recent_transactions": transactions,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListCustomersParams {
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

// GET /api/customers
pub async fn list_customers(
    State(app_state): State<AppState>,
    Query(params): Query<ListCustomersParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page_to_limit_offset(params.page, params.per_page);
    let customers = app_state
        .customer_service
        .list_customers(
            params.search.as_deref(),
            !params.include_inactive,
            limit,
            offset,
        )
        .await?;
    Ok(Json(customers))
}

// DELETE /api/customers/{id} — exclusão lógica, somente Admin
pub async fn delete_customer(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.deactivate_customer(id).await?;
    Ok(Json(customer))
}

// GET /api/customers/{id}/loyalty — saldo + extrato recente
pub async fn loyalty_summary(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (customer, transactions) = app_state.customer_service.loyalty_summary(id, 10).await?;
    Ok(Json(json!({
        "customer": customer,
        "transactions": transactions,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustLoyaltyPayload {
    // Positivo credita, negativo debita; zero é rejeitado no service.
    pub points: i32,
    #[validate(length(min = 1, message = "O motivo do ajuste é obrigatório."))]
    pub reason: String,
}

// POST /api/customers/{id}/loyalty/adjust — somente Admin
pub async fn adjust_loyalty(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustLoyaltyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (customer, transaction) = app_state
        .customer_service
        .adjust_loyalty_points(id, payload.points, &payload.reason)
        .await?;
    Ok(Json(json!({
        "customer": customer,
        "transaction": transaction,
    })))
}
