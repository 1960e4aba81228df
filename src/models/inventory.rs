// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- 1. Filiais ---
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Branch {
    pub id: Uuid,
    pub branch_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// --- 2. Saldo de Estoque ---
// Exatamente uma linha por (produto, filial) — constraint unique_product_branch.
// 'available_stock' é calculado na query (current - reserved); o saldo nunca é
// editado diretamente, só pelo caminho movimento + saldo na mesma transação.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub current_stock: i32,
    pub reserved_stock: i32,
    pub available_stock: i32,
    pub last_updated: DateTime<Utc>,
}

// --- 3. Movimentações ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum MovementType {
    In,         // Vira "IN"
    Out,        // Vira "OUT"
    Transfer,   // Vira "TRANSFER"
    Adjustment, // Vira "ADJUSTMENT"
}

// Registro imutável do livro-razão de estoque.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
