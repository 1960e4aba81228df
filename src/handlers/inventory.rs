// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
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
        rbac::{RequireRole, StockAccess},
    },
    models::inventory::MovementType,
};

#[derive(Debug, Deserialize)]
pub struct ListInventoryParams {
    pub branch_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

// GET /api/inventory
pub async fn list_inventory(
    State(app_state): State<AppState>,
    Query(params): Query<ListInventoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page_to_limit_offset(params.page, params.per_page);
    let records = app_state
        .inventory_service
        .list_records(
            params.branch_id,
            params.search.as_deref(),
            params.low_stock_only,
            limit,
            offset,
        )
        .await?;
    Ok(Json(records))
}

// GET /api/inventory/product/{id} — saldo do produto em todas as filiais
pub async fn stock_by_product(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let records = app_state.inventory_service.stock_by_product(product_id).await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    pub branch_id: Option<Uuid>,
}

// GET /api/inventory/low-stock
pub async fn low_stock(
    State(app_state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> Result<impl IntoResponse, AppError> {
    let records = app_state.inventory_service.low_stock(params.branch_id).await?;
    Ok(Json(records))
}

// ---
// Ajuste manual
// ---

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockPayload {
    pub product_id: Uuid,
    pub branch_id: Uuid,
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: i32,
    pub movement_type: MovementType,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

// POST /api/inventory/adjust
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<StockAccess>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (record, movement) = app_state
        .inventory_service
        .adjust_stock(
            user.0.id,
            payload.product_id,
            payload.branch_id,
            payload.quantity,
            payload.movement_type,
            payload.unit_cost,
            payload.reference.as_deref(),
            payload.notes.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "inventory": record, "movement": movement })))
}

// ---
// Transferência entre filiais
// ---

#[derive(Debug, Deserialize, Validate)]
pub struct TransferStockPayload {
    pub product_id: Uuid,
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: i32,
    pub notes: Option<String>,
}

// POST /api/inventory/transfer
pub async fn transfer_stock(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<StockAccess>,
    Json(payload): Json<TransferStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (from_record, to_record, reference) = app_state
        .inventory_service
        .transfer_stock(
            user.0.id,
            payload.product_id,
            payload.from_branch_id,
            payload.to_branch_id,
            payload.quantity,
            payload.notes.as_deref(),
        )
        .await?;
    Ok(Json(json!({
        "reference": reference,
        "from": from_record,
        "to": to_record,
    })))
}

// ---
// Livro-razão de movimentações
// ---

#[derive(Debug, Deserialize)]
pub struct ListMovementsParams {
    pub product_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

// GET /api/inventory/movements
pub async fn list_movements(
    State(app_state): State<AppState>,
    Query(params): Query<ListMovementsParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page_to_limit_offset(params.page, params.per_page);
    let movements = app_state
        .inventory_service
        .list_movements(
            params.product_id,
            params.branch_id,
            params.movement_type,
            limit,
            offset,
        )
        .await?;
    Ok(Json(movements))
}
