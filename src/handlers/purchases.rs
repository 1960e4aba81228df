// src/handlers/purchases.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{default_page, default_per_page, page_to_limit_offset},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole, StockAccess},
    },
    models::purchase::PurchaseOrderStatus,
    services::purchase_service::{PurchaseOrderDraft, PurchaseOrderDraftLine, ReceivedLine},
};

#[derive(Debug, Deserialize, serde::Serialize, Validate)]
pub struct PurchaseOrderItemPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade pedida deve ser positiva."))]
    pub ordered_quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrderPayload {
    pub supplier_id: Uuid,
    pub branch_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "O pedido precisa de pelo menos um item."))]
    #[validate(nested)]
    pub items: Vec<PurchaseOrderItemPayload>,
}

// POST /api/purchases
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<StockAccess>,
    Json(payload): Json<CreatePurchaseOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = PurchaseOrderDraft {
        supplier_id: payload.supplier_id,
        branch_id: payload.branch_id,
        expected_delivery_date: payload.expected_delivery_date,
        notes: payload.notes,
        items: payload
            .items
            .into_iter()
            .map(|item| PurchaseOrderDraftLine {
                product_id: item.product_id,
                ordered_quantity: item.ordered_quantity,
                unit_cost: item.unit_cost,
            })
            .collect(),
    };

    let order = app_state
        .purchase_service
        .create_order(user.0.id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

// POST /api/purchases/{id}/approve — somente Admin
pub async fn approve_order(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.purchase_service.approve_order(id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize, serde::Serialize, Validate)]
pub struct ReceiveItemPayload {
    pub item_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade recebida deve ser positiva."))]
    pub received_quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReceiveOrderPayload {
    #[validate(length(min = 1, message = "Informe pelo menos um item recebido."))]
    #[validate(nested)]
    pub items: Vec<ReceiveItemPayload>,
}

// POST /api/purchases/{id}/receive
pub async fn receive_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<StockAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceiveOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let received = payload
        .items
        .into_iter()
        .map(|item| ReceivedLine {
            item_id: item.item_id,
            received_quantity: item.received_quantity,
        })
        .collect();

    let order = app_state
        .purchase_service
        .receive_order(user.0.id, id, received)
        .await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelOrderPayload {
    #[validate(length(min = 1, message = "O motivo do cancelamento é obrigatório."))]
    pub reason: String,
}

// POST /api/purchases/{id}/cancel
pub async fn cancel_order(
    State(app_state): State<AppState>,
    _guard: RequireRole<StockAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state
        .purchase_service
        .cancel_order(id, &payload.reason)
        .await?;
    Ok(Json(order))
}

// GET /api/purchases/{id}
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.purchase_service.get_order(id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub supplier_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub status: Option<PurchaseOrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

// GET /api/purchases
pub async fn list_orders(
    State(app_state): State<AppState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page_to_limit_offset(params.page, params.per_page);
    let orders = app_state
        .purchase_service
        .list_orders(
            params.supplier_id,
            params.branch_id,
            params.status,
            params.start_date,
            params.end_date,
            limit,
            offset,
        )
        .await?;
    Ok(Json(orders))
}
