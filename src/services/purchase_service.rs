// src/services/purchase_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, InventoryRepository, PurchaseRepository},
    models::{
        inventory::MovementType,
        purchase::{PurchaseOrder, PurchaseOrderStatus, PurchaseOrderWithItems},
    },
};

#[derive(Debug)]
pub struct PurchaseOrderDraft {
    pub supplier_id: Uuid,
    pub branch_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<PurchaseOrderDraftLine>,
}

#[derive(Debug)]
pub struct PurchaseOrderDraftLine {
    pub product_id: Uuid,
    pub ordered_quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug)]
pub struct ReceivedLine {
    pub item_id: Uuid,
    pub received_quantity: i32,
}

fn generate_po_number() -> String {
    let today = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("PO-{today}-{suffix}")
}

/// O pedido só fecha quando TODAS as linhas atingem a quantidade pedida.
/// Recebimento acima do pedido também conta como linha completa.
fn all_lines_received(items: &[crate::models::purchase::PurchaseOrderItem]) -> bool {
    items
        .iter()
        .all(|i| i.received_quantity >= i.ordered_quantity)
}

#[derive(Clone)]
pub struct PurchaseService {
    pool: PgPool,
    purchase_repo: PurchaseRepository,
    inventory_repo: InventoryRepository,
    catalog_repo: CatalogRepository,
}

impl PurchaseService {
    pub fn new(
        pool: PgPool,
        purchase_repo: PurchaseRepository,
        inventory_repo: InventoryRepository,
        catalog_repo: CatalogRepository,
    ) -> Self {
        Self {
            pool,
            purchase_repo,
            inventory_repo,
            catalog_repo,
        }
    }

    /// Cria o pedido em Pending. Nada de estoque ainda: o saldo só muda no
    /// recebimento.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        draft: PurchaseOrderDraft,
    ) -> Result<PurchaseOrderWithItems, AppError> {
        if draft.items.is_empty() {
            return Err(AppError::BadRequest(
                "O pedido precisa de pelo menos um item.".into(),
            ));
        }

        self.catalog_repo
            .find_supplier(draft.supplier_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(AppError::SupplierNotFound)?;
        self.catalog_repo
            .find_active_branch(draft.branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;

        // Valida linhas e calcula os totais antes de abrir a transação
        let mut validated = Vec::with_capacity(draft.items.len());
        let mut sub_total = Decimal::ZERO;
        for line in &draft.items {
            if line.ordered_quantity <= 0 || line.unit_cost <= Decimal::ZERO {
                return Err(AppError::BadRequest(
                    "Cada item precisa de quantidade e custo unitário positivos.".into(),
                ));
            }
            self.catalog_repo
                .find_product(&self.pool, line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or(AppError::ProductNotFound)?;

            let line_total = line.unit_cost * Decimal::from(line.ordered_quantity);
            sub_total += line_total;
            validated.push((line, line_total));
        }
        let total_amount = sub_total;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let po_number = generate_po_number();
        let order = self
            .purchase_repo
            .insert_order(
                &mut *tx,
                &po_number,
                draft.supplier_id,
                draft.branch_id,
                draft.expected_delivery_date,
                sub_total,
                total_amount,
                draft.notes.as_deref(),
                user_id,
            )
            .await?;

        let mut items = Vec::with_capacity(validated.len());
        for (line, line_total) in &validated {
            let item = self
                .purchase_repo
                .insert_item(
                    &mut *tx,
                    order.id,
                    line.product_id,
                    line.ordered_quantity,
                    line.unit_cost,
                    *line_total,
                )
                .await?;
            items.push(item);
        }

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(po_number = %order.po_number, total = %order.total_amount, "Pedido de compra criado");
        Ok(PurchaseOrderWithItems { order, items })
    }

    pub async fn approve_order(&self, order_id: Uuid) -> Result<PurchaseOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .purchase_repo
            .find_by_id_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound)?;
        order.status.ensure_can_approve()?;

        let updated = self
            .purchase_repo
            .set_status(&mut *tx, order.id, PurchaseOrderStatus::Approved, None)
            .await?;

        tx.commit().await?;

        tracing::info!(po_number = %updated.po_number, "Pedido de compra aprovado");
        Ok(updated)
    }

    /// Recebimento (pode ser parcial). Cada linha recebida entra no estoque da
    /// filial do pedido com um movimento IN referenciando o po_number. O pedido
    /// só vira Received quando todas as linhas atingem o pedido; receber acima
    /// do pedido não é bloqueado.
    pub async fn receive_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        received: Vec<ReceivedLine>,
    ) -> Result<PurchaseOrderWithItems, AppError> {
        if received.is_empty() {
            return Err(AppError::BadRequest("Nenhum item para receber.".into()));
        }

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let order = self
            .purchase_repo
            .find_by_id_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound)?;
        order.status.ensure_can_receive()?;

        for line in &received {
            if line.received_quantity <= 0 {
                continue;
            }

            let item = self
                .purchase_repo
                .find_item(&mut *tx, line.item_id)
                .await?
                .filter(|i| i.purchase_order_id == order.id)
                .ok_or_else(|| {
                    AppError::BadRequest("Item não pertence a este pedido.".into())
                })?;

            self.purchase_repo
                .add_received_quantity(&mut *tx, item.id, line.received_quantity)
                .await?;

            self.inventory_repo
                .apply_stock_delta(&mut *tx, item.product_id, order.branch_id, line.received_quantity)
                .await?;
            self.inventory_repo
                .record_movement(
                    &mut *tx,
                    item.product_id,
                    order.branch_id,
                    MovementType::In,
                    line.received_quantity,
                    Some(item.unit_cost),
                    Some(&order.po_number),
                    Some(&format!("Recebimento do pedido {}", order.po_number)),
                    user_id,
                )
                .await?;
        }

        // Relê as linhas já atualizadas para decidir o status final
        let items = self.purchase_repo.items_for_order(&mut *tx, order.id).await?;

        let order = if all_lines_received(&items) {
            self.purchase_repo
                .set_status(&mut *tx, order.id, PurchaseOrderStatus::Received, None)
                .await?
        } else {
            order
        };

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(
            po_number = %order.po_number,
            status = order.status.as_str(),
            "Recebimento registrado"
        );
        Ok(PurchaseOrderWithItems { order, items })
    }

    pub async fn cancel_order(&self, order_id: Uuid, reason: &str) -> Result<PurchaseOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .purchase_repo
            .find_by_id_for_update(&mut *tx, order_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound)?;
        order.status.ensure_can_cancel()?;

        let notes = format!(
            "{} | CANCELLED: {reason}",
            order.notes.clone().unwrap_or_default()
        );
        let updated = self
            .purchase_repo
            .set_status(&mut *tx, order.id, PurchaseOrderStatus::Cancelled, Some(&notes))
            .await?;

        tx.commit().await?;

        tracing::info!(po_number = %updated.po_number, "Pedido de compra cancelado");
        Ok(updated)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<PurchaseOrderWithItems, AppError> {
        let order = self
            .purchase_repo
            .find_by_id(order_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound)?;
        let items = self.purchase_repo.items_for_order_pool(order.id).await?;
        Ok(PurchaseOrderWithItems { order, items })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list_orders(
        &self,
        supplier_id: Option<Uuid>,
        branch_id: Option<Uuid>,
        status: Option<PurchaseOrderStatus>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        self.purchase_repo
            .list(supplier_id, branch_id, status, start_date, end_date, limit, offset)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::purchase::PurchaseOrderItem;

    #[test]
    fn po_number_has_expected_shape() {
        let number = generate_po_number();
        assert!(number.starts_with("PO-"));
        assert_eq!(number.len(), "PO-".len() + 8 + 1 + 8);
    }

    fn item(ordered: i32, received: i32) -> PurchaseOrderItem {
        PurchaseOrderItem {
            id: Uuid::new_v4(),
            purchase_order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            ordered_quantity: ordered,
            received_quantity: received,
            unit_cost: Decimal::ONE,
            line_total: Decimal::ONE,
        }
    }

    #[test]
    fn partial_receipt_keeps_order_open() {
        let items = [item(10, 10), item(5, 3)];
        assert!(!all_lines_received(&items));
    }

    #[test]
    fn full_receipt_closes_order() {
        let items = [item(10, 10), item(5, 5)];
        assert!(all_lines_received(&items));
    }

    #[test]
    fn over_receipt_still_counts_as_complete() {
        let items = [item(10, 12), item(5, 5)];
        assert!(all_lines_received(&items));
    }
}
