// src/services/inventory_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, InventoryRepository},
    models::inventory::{InventoryRecord, MovementType, StockMovement},
};

/// Par de deltas da transferência: débito na origem, crédito no destino.
/// Os dois movimentos carregam a mesma referência, então a soma é sempre zero.
fn transfer_deltas(quantity: i32) -> (i32, i32) {
    (-quantity, quantity)
}

fn generate_transfer_reference() -> String {
    format!("TRANSFER-{}", Utc::now().format("%Y%m%d%H%M%S"))
}

#[derive(Clone)]
pub struct InventoryService {
    pool: PgPool,
    inventory_repo: InventoryRepository,
    catalog_repo: CatalogRepository,
}

impl InventoryService {
    pub fn new(
        pool: PgPool,
        inventory_repo: InventoryRepository,
        catalog_repo: CatalogRepository,
    ) -> Self {
        Self {
            pool,
            inventory_repo,
            catalog_repo,
        }
    }

    /// Ajuste manual de estoque: IN soma, OUT subtrai (com checagem de saldo),
    /// ADJUSTMENT grava o valor absoluto. TRANSFER não passa por aqui.
    /// Saldo e movimento mudam juntos, na mesma transação.
    #[allow(clippy::too_many_arguments)]
    pub async fn adjust_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        branch_id: Uuid,
        quantity: i32,
        movement_type: MovementType,
        unit_cost: Option<Decimal>,
        reference: Option<&str>,
        notes: Option<&str>,
    ) -> Result<(InventoryRecord, StockMovement), AppError> {
        if movement_type == MovementType::Transfer {
            return Err(AppError::InvalidMovementType);
        }
        if quantity < 0 || (quantity == 0 && movement_type != MovementType::Adjustment) {
            return Err(AppError::BadRequest("A quantidade deve ser positiva.".into()));
        }

        let product = self
            .catalog_repo
            .find_product(&self.pool, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.catalog_repo
            .find_branch(branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 1. Trava o saldo atual antes de decidir o delta
        let current = self
            .inventory_repo
            .get_record_for_update(&mut *tx, product_id, branch_id)
            .await?
            .map(|r| r.current_stock)
            .unwrap_or(0);

        // 2. Aplica no saldo
        let record = match movement_type {
            MovementType::In => {
                self.inventory_repo
                    .apply_stock_delta(&mut *tx, product_id, branch_id, quantity)
                    .await?
            }
            MovementType::Out => {
                if current < quantity {
                    return Err(AppError::InsufficientStock(product.product_name));
                }
                self.inventory_repo
                    .apply_stock_delta(&mut *tx, product_id, branch_id, -quantity)
                    .await?
            }
            MovementType::Adjustment => {
                self.inventory_repo
                    .set_stock(&mut *tx, product_id, branch_id, quantity)
                    .await?
            }
            MovementType::Transfer => unreachable!(),
        };

        // 3. Registra no livro-razão (OUT fica negativo)
        let signed_quantity = if movement_type == MovementType::Out {
            -quantity
        } else {
            quantity
        };
        let movement = self
            .inventory_repo
            .record_movement(
                &mut *tx,
                product_id,
                branch_id,
                movement_type,
                signed_quantity,
                unit_cost,
                reference,
                notes,
                user_id,
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(
            product = %product.product_code,
            movement_type = ?movement_type,
            quantity = signed_quantity,
            "Ajuste de estoque aplicado"
        );
        Ok((record, movement))
    }

    /// Transferência entre filiais: débito na origem + crédito no destino +
    /// um par de movimentos TRANSFER amarrados pela mesma referência.
    pub async fn transfer_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        from_branch_id: Uuid,
        to_branch_id: Uuid,
        quantity: i32,
        notes: Option<&str>,
    ) -> Result<(InventoryRecord, InventoryRecord, String), AppError> {
        if from_branch_id == to_branch_id {
            return Err(AppError::InvalidTransfer);
        }
        if quantity <= 0 {
            return Err(AppError::BadRequest("A quantidade deve ser positiva.".into()));
        }

        let product = self
            .catalog_repo
            .find_product(&self.pool, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        let from_branch = self
            .catalog_repo
            .find_branch(from_branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;
        let to_branch = self
            .catalog_repo
            .find_branch(to_branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 1. Trava a origem e checa o disponível
        let source = self
            .inventory_repo
            .get_record_for_update(&mut *tx, product_id, from_branch_id)
            .await?;
        let available = source.as_ref().map(|r| r.available_stock).unwrap_or(0);
        if available < quantity {
            return Err(AppError::InsufficientStock(product.product_name));
        }

        // 2. Débito + crédito
        let (out_delta, in_delta) = transfer_deltas(quantity);
        let from_record = self
            .inventory_repo
            .apply_stock_delta(&mut *tx, product_id, from_branch_id, out_delta)
            .await?;
        let to_record = self
            .inventory_repo
            .apply_stock_delta(&mut *tx, product_id, to_branch_id, in_delta)
            .await?;

        // 3. Par de movimentos com a mesma referência
        let reference = generate_transfer_reference();
        let out_notes = format!(
            "Transferência para {}.{}",
            to_branch.branch_name,
            notes.map(|n| format!(" {n}")).unwrap_or_default()
        );
        let in_notes = format!(
            "Transferência de {}.{}",
            from_branch.branch_name,
            notes.map(|n| format!(" {n}")).unwrap_or_default()
        );

        self.inventory_repo
            .record_movement(
                &mut *tx,
                product_id,
                from_branch_id,
                MovementType::Transfer,
                out_delta,
                None,
                Some(&reference),
                Some(&out_notes),
                user_id,
            )
            .await?;
        self.inventory_repo
            .record_movement(
                &mut *tx,
                product_id,
                to_branch_id,
                MovementType::Transfer,
                in_delta,
                None,
                Some(&reference),
                Some(&in_notes),
                user_id,
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(
            product = %product.product_code,
            from = %from_branch.branch_name,
            to = %to_branch.branch_name,
            quantity,
            %reference,
            "Transferência concluída"
        );
        Ok((from_record, to_record, reference))
    }

    // ---
    // Consultas (passthrough para o repo)
    // ---

    pub async fn list_records(
        &self,
        branch_id: Option<Uuid>,
        search: Option<&str>,
        low_stock_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InventoryRecord>, AppError> {
        self.inventory_repo
            .list_records(branch_id, search, low_stock_only, limit, offset)
            .await
    }

    pub async fn stock_by_product(&self, product_id: Uuid) -> Result<Vec<InventoryRecord>, AppError> {
        self.catalog_repo
            .find_product(&self.pool, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.inventory_repo.list_by_product(product_id).await
    }

    pub async fn low_stock(&self, branch_id: Option<Uuid>) -> Result<Vec<InventoryRecord>, AppError> {
        self.inventory_repo.list_low_stock(branch_id).await
    }

    pub async fn list_movements(
        &self,
        product_id: Option<Uuid>,
        branch_id: Option<Uuid>,
        movement_type: Option<MovementType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StockMovement>, AppError> {
        self.inventory_repo
            .list_movements(product_id, branch_id, movement_type, limit, offset)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_pair_mirrors_quantity() {
        let (out_delta, in_delta) = transfer_deltas(5);
        assert_eq!(out_delta, -5);
        assert_eq!(in_delta, 5);
        assert_eq!(out_delta + in_delta, 0);
    }

    #[test]
    fn transfer_reference_has_expected_shape() {
        let reference = generate_transfer_reference();
        assert!(reference.starts_with("TRANSFER-"));
        // TRANSFER- + AAAAMMDDHHMMSS
        assert_eq!(reference.len(), "TRANSFER-".len() + 14);
    }
}
