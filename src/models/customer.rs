// src/models/customer.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Saldo corrente (loyalty_points / total_purchases) + razão em
// loyalty_transactions; os dois mudam sempre na mesma transação.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub customer_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub loyalty_points: i32,
    pub total_purchases: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "loyalty_transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTransactionType {
    Earned,
    Redeemed,
    Expired,
    Adjusted,
}

// Registro imutável do razão de pontos.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoyaltyTransaction {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub sale_id: Option<Uuid>,
    pub transaction_type: LoyaltyTransactionType,
    pub points: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
