// src/handlers/sales.rs

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
    handlers::{default_page, default_per_page, page_to_limit_offset, validate_not_negative},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, SalesAccess},
    },
    models::sales::PaymentMethod,
    services::sales_service::{SaleDraft, SaleDraftLine},
};

#[derive(Debug, Deserialize, serde::Serialize, Validate)]
pub struct SaleItemPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: i32,
    // Sem preço informado, vale o selling_price do catálogo.
    pub unit_price: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub discount_amount: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalePayload {
    pub branch_id: Uuid,
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, message = "A venda precisa de pelo menos um item."))]
    #[validate(nested)]
    pub items: Vec<SaleItemPayload>,
    pub payment_method: PaymentMethod,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub discount_amount: Decimal,
    pub notes: Option<String>,
}

// POST /api/sales
pub async fn create_sale(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<SalesAccess>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = SaleDraft {
        branch_id: payload.branch_id,
        customer_id: payload.customer_id,
        items: payload
            .items
            .into_iter()
            .map(|item| SaleDraftLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount_amount: item.discount_amount,
            })
            .collect(),
        payment_method: payload.payment_method,
        discount_amount: payload.discount_amount,
        notes: payload.notes,
    };

    let sale = app_state.sales_service.create_sale(user.0.id, draft).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefundSalePayload {
    #[validate(length(min = 1, message = "O motivo do estorno é obrigatório."))]
    pub reason: String,
}

// POST /api/sales/{id}/refund
pub async fn refund_sale(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequireRole<SalesAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RefundSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sale = app_state
        .sales_service
        .refund_sale(user.0.id, id, &payload.reason)
        .await?;
    Ok(Json(sale))
}

// GET /api/sales/{id}
pub async fn get_sale(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sale = app_state.sales_service.get_sale(id).await?;
    Ok(Json(sale))
}

#[derive(Debug, Deserialize)]
pub struct ListSalesParams {
    pub branch_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

// GET /api/sales
pub async fn list_sales(
    State(app_state): State<AppState>,
    Query(params): Query<ListSalesParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page_to_limit_offset(params.page, params.per_page);
    let sales = app_state
        .sales_service
        .list_sales(
            params.branch_id,
            params.cashier_id,
            params.payment_method,
            params.start_date,
            params.end_date,
            limit,
            offset,
        )
        .await?;
    Ok(Json(sales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payload(line_discount: &str, order_discount: &str) -> CreateSalePayload {
        CreateSalePayload {
            branch_id: Uuid::new_v4(),
            customer_id: None,
            items: vec![SaleItemPayload {
                product_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: None,
                discount_amount: Decimal::from_str(line_discount).unwrap(),
            }],
            payment_method: PaymentMethod::Cash,
            discount_amount: Decimal::from_str(order_discount).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn negative_line_discount_is_rejected() {
        assert!(payload("-1.00", "0").validate().is_err());
    }

    #[test]
    fn negative_order_discount_is_rejected() {
        assert!(payload("0", "-5.00").validate().is_err());
    }

    #[test]
    fn non_negative_discounts_pass_validation() {
        assert!(payload("0", "2.50").validate().is_ok());
    }
}
