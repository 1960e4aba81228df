// src/models/purchase.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::AppError;

// Ciclo de vida: Pending -> Approved -> Received, ou -> Cancelled
// (Cancelled só a partir de Pending/Approved; Received e Cancelled são terminais).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "po_status")]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Received => "Received",
            Self::Cancelled => "Cancelled",
        }
    }

    // Guarda das transições. Qualquer outra combinação é rejeitada com 400.
    pub fn ensure_can_approve(&self) -> Result<(), AppError> {
        match self {
            Self::Pending => Ok(()),
            _ => Err(AppError::InvalidStateTransition(format!(
                "Apenas pedidos pendentes podem ser aprovados (status atual: {}).",
                self.as_str()
            ))),
        }
    }

    pub fn ensure_can_receive(&self) -> Result<(), AppError> {
        match self {
            Self::Approved => Ok(()),
            _ => Err(AppError::InvalidStateTransition(format!(
                "O pedido precisa estar aprovado antes do recebimento (status atual: {}).",
                self.as_str()
            ))),
        }
    }

    pub fn ensure_can_cancel(&self) -> Result<(), AppError> {
        match self {
            Self::Pending | Self::Approved => Ok(()),
            _ => Err(AppError::InvalidStateTransition(format!(
                "Pedidos recebidos ou já cancelados não podem ser cancelados (status atual: {}).",
                self.as_str()
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_id: Uuid,
    pub branch_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub ordered_quantity: i32,
    pub received_quantity: i32,
    pub unit_cost: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PurchaseOrderWithItems {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_only_from_pending() {
        assert!(PurchaseOrderStatus::Pending.ensure_can_approve().is_ok());
        assert!(PurchaseOrderStatus::Approved.ensure_can_approve().is_err());
        assert!(PurchaseOrderStatus::Received.ensure_can_approve().is_err());
        assert!(PurchaseOrderStatus::Cancelled.ensure_can_approve().is_err());
    }

    #[test]
    fn receive_only_from_approved() {
        assert!(PurchaseOrderStatus::Approved.ensure_can_receive().is_ok());
        assert!(PurchaseOrderStatus::Pending.ensure_can_receive().is_err());
        assert!(PurchaseOrderStatus::Received.ensure_can_receive().is_err());
    }

    #[test]
    fn cancel_blocked_on_terminal_states() {
        assert!(PurchaseOrderStatus::Pending.ensure_can_cancel().is_ok());
        assert!(PurchaseOrderStatus::Approved.ensure_can_cancel().is_ok());
        assert!(PurchaseOrderStatus::Received.ensure_can_cancel().is_err());
        assert!(PurchaseOrderStatus::Cancelled.ensure_can_cancel().is_err());
    }
}
