// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{default_page, default_per_page, page_to_limit_offset, validate_not_negative},
    middleware::rbac::{AdminOnly, RequireRole, StockAccess},
    models::catalog::Supplier,
    services::catalog_service::ProductDraft,
};

fn default_unit() -> String {
    "unit".to_string()
}

// ---
// Produtos
// ---

#[derive(Debug, Deserialize, Validate)]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "O código do produto é obrigatório."))]
    pub product_code: String,

    pub barcode: Option<String>,

    #[validate(length(min = 1, message = "O nome do produto é obrigatório."))]
    pub product_name: String,

    pub description: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Option<Uuid>,

    #[serde(default = "default_unit")]
    pub unit_of_measure: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cost_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub selling_price: Decimal,

    #[validate(range(min = 0, message = "Nível de estoque não pode ser negativo."))]
    #[serde(default)]
    pub min_stock_level: i32,

    #[validate(range(min = 0, message = "Nível de estoque não pode ser negativo."))]
    #[serde(default)]
    pub max_stock_level: i32,

    #[validate(range(min = 0, message = "Nível de reposição não pode ser negativo."))]
    #[serde(default)]
    pub reorder_level: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub tax_rate: Decimal,

    // Só considerado no update; omitido, o flag atual é preservado.
    pub is_active: Option<bool>,
}

impl ProductPayload {
    fn into_draft(self) -> (ProductDraft, Option<bool>) {
        let is_active = self.is_active;
        (
            ProductDraft {
                product_code: self.product_code,
                barcode: self.barcode,
                product_name: self.product_name,
                description: self.description,
                category_id: self.category_id,
                supplier_id: self.supplier_id,
                unit_of_measure: self.unit_of_measure,
                cost_price: self.cost_price,
                selling_price: self.selling_price,
                min_stock_level: self.min_stock_level,
                max_stock_level: self.max_stock_level,
                reorder_level: self.reorder_level,
                tax_rate: self.tax_rate,
            },
            is_active,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

// POST /api/products
pub async fn create_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<StockAccess>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (draft, _) = payload.into_draft();

    let product = app_state.catalog_service.create_product(draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page_to_limit_offset(params.page, params.per_page);
    let products = app_state
        .catalog_service
        .list_products(
            params.search.as_deref(),
            params.category_id,
            !params.include_inactive,
            limit,
            offset,
        )
        .await?;
    Ok(Json(products))
}

// GET /api/products/{id}
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get_product(id).await?;
    Ok(Json(product))
}

// GET /api/products/barcode/{barcode}
pub async fn get_product_by_barcode(
    State(app_state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state
        .catalog_service
        .get_product_by_barcode(&barcode)
        .await?;
    Ok(Json(product))
}

// PUT /api/products/{id}
pub async fn update_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<StockAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (draft, is_active) = payload.into_draft();

    let product = app_state
        .catalog_service
        .update_product(id, draft, is_active)
        .await?;
    Ok(Json(product))
}

// DELETE /api/products/{id} — exclusão lógica, somente Admin
pub async fn delete_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.deactivate_product(id).await?;
    Ok(Json(product))
}

// ---
// Categorias
// ---

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryPayload {
    #[validate(length(min = 1, message = "O nome da categoria é obrigatório."))]
    pub category_name: String,
    pub description: Option<String>,
    pub parent_category_id: Option<Uuid>,
}

// POST /api/products/categories
pub async fn create_category(
    State(app_state): State<AppState>,
    _guard: RequireRole<StockAccess>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state
        .catalog_service
        .create_category(
            &payload.category_name,
            payload.description.as_deref(),
            payload.parent_category_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// PUT /api/products/categories/{id}
pub async fn update_category(
    State(app_state): State<AppState>,
    _guard: RequireRole<StockAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state
        .catalog_service
        .update_category(
            id,
            &payload.category_name,
            payload.description.as_deref(),
            payload.parent_category_id,
        )
        .await?;
    Ok(Json(category))
}

// GET /api/products/categories
pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.catalog_service.list_categories().await?;
    Ok(Json(categories))
}

// ---
// Fornecedores
// ---

#[derive(Debug, Deserialize, Validate)]
pub struct SupplierPayload {
    #[validate(length(min = 1, message = "O nome do fornecedor é obrigatório."))]
    pub supplier_name: String,
    pub contact_person: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub payment_terms: Option<String>,
    pub is_active: Option<bool>,
}

// POST /api/suppliers
pub async fn create_supplier(
    State(app_state): State<AppState>,
    _guard: RequireRole<StockAccess>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let supplier = app_state
        .catalog_service
        .create_supplier(
            &payload.supplier_name,
            payload.contact_person.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.address.as_deref(),
            payload.tax_number.as_deref(),
            payload.payment_terms.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

// PUT /api/suppliers/{id}
pub async fn update_supplier(
    State(app_state): State<AppState>,
    _guard: RequireRole<StockAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let existing = app_state.catalog_service.get_supplier(id).await?;
    let supplier = Supplier {
        supplier_name: payload.supplier_name,
        contact_person: payload.contact_person,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        tax_number: payload.tax_number,
        payment_terms: payload.payment_terms,
        is_active: payload.is_active.unwrap_or(existing.is_active),
        ..existing
    };
    let updated = app_state.catalog_service.update_supplier(&supplier).await?;
    Ok(Json(updated))
}

// GET /api/suppliers/{id}
pub async fn get_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = app_state.catalog_service.get_supplier(id).await?;
    Ok(Json(supplier))
}

// GET /api/suppliers
pub async fn list_suppliers(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let suppliers = app_state.catalog_service.list_suppliers().await?;
    Ok(Json(suppliers))
}
