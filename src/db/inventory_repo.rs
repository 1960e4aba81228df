// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{InventoryRecord, MovementType, StockMovement},
};

// Colunas do saldo, com o disponível calculado na própria query.
const INVENTORY_COLS: &str =
    "id, product_id, branch_id, current_stock, reserved_stock, \
     current_stock - reserved_stock AS available_stock, last_updated";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    /// Lê o saldo travando a linha (FOR UPDATE). Tem que rodar dentro da
    /// transação que faz o check-then-decrement, senão duas vendas
    /// concorrentes passam as duas na checagem de disponibilidade.
    pub async fn get_record_for_update<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        branch_id: Uuid,
    ) -> Result<Option<InventoryRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {INVENTORY_COLS} FROM inventory \
             WHERE product_id = $1 AND branch_id = $2 FOR UPDATE"
        ))
        .bind(product_id)
        .bind(branch_id)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    pub async fn list_records(
        &self,
        branch_id: Option<Uuid>,
        search: Option<&str>,
        low_stock_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InventoryRecord>, AppError> {
        let pattern = search.map(|s| format!("%{s}%"));
        let records = sqlx::query_as::<_, InventoryRecord>(&format!(
            r#"
            SELECT i.{INVENTORY_COLS_QUALIFIED}
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            WHERE ($1::uuid IS NULL OR i.branch_id = $1)
              AND ($2::text IS NULL
                   OR p.product_name ILIKE $2 OR p.product_code ILIKE $2 OR p.barcode ILIKE $2)
              AND (NOT $3 OR i.current_stock <= p.reorder_level)
            ORDER BY p.product_name ASC
            LIMIT $4 OFFSET $5
            "#,
            INVENTORY_COLS_QUALIFIED = "id, i.product_id, i.branch_id, i.current_stock, \
                i.reserved_stock, i.current_stock - i.reserved_stock AS available_stock, \
                i.last_updated"
        ))
        .bind(branch_id)
        .bind(pattern)
        .bind(low_stock_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn list_by_product(&self, product_id: Uuid) -> Result<Vec<InventoryRecord>, AppError> {
        let records = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {INVENTORY_COLS} FROM inventory WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    // Itens no nível de reposição ou abaixo, só de produto ativo.
    pub async fn list_low_stock(&self, branch_id: Option<Uuid>) -> Result<Vec<InventoryRecord>, AppError> {
        let records = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT i.id, i.product_id, i.branch_id, i.current_stock, i.reserved_stock,
                   i.current_stock - i.reserved_stock AS available_stock, i.last_updated
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            WHERE i.current_stock <= p.reorder_level
              AND p.is_active = TRUE
              AND ($1::uuid IS NULL OR i.branch_id = $1)
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn list_movements(
        &self,
        product_id: Option<Uuid>,
        branch_id: Option<Uuid>,
        movement_type: Option<MovementType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StockMovement>, AppError> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR branch_id = $2)
              AND ($3::movement_type IS NULL OR movement_type = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(product_id)
        .bind(branch_id)
        .bind(movement_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }

    // ---
    // Escrita (sempre dentro da transação do service)
    // ---

    /// "UPSERT" do saldo: cria a linha (produto, filial) se não existir,
    /// senão soma o delta de forma atômica.
    pub async fn apply_stock_delta<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        branch_id: Uuid,
        delta: i32,
    ) -> Result<InventoryRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            r#"
            INSERT INTO inventory (product_id, branch_id, current_stock)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, branch_id)
            DO UPDATE SET
                current_stock = inventory.current_stock + $3,
                last_updated = now()
            RETURNING {INVENTORY_COLS}
            "#
        ))
        .bind(product_id)
        .bind(branch_id)
        .bind(delta)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    /// Só para ADJUSTMENT: grava o valor absoluto informado.
    pub async fn set_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        branch_id: Uuid,
        new_stock: i32,
    ) -> Result<InventoryRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            r#"
            INSERT INTO inventory (product_id, branch_id, current_stock)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, branch_id)
            DO UPDATE SET
                current_stock = $3,
                last_updated = now()
            RETURNING {INVENTORY_COLS}
            "#
        ))
        .bind(product_id)
        .bind(branch_id)
        .bind(new_stock)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    /// Registra uma movimentação no livro-razão (auditoria).
    #[allow(clippy::too_many_arguments)]
    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        branch_id: Uuid,
        movement_type: MovementType,
        quantity: i32,
        unit_cost: Option<Decimal>,
        reference: Option<&str>,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements
                (product_id, branch_id, movement_type, quantity, unit_cost, reference, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(branch_id)
        .bind(movement_type)
        .bind(quantity)
        .bind(unit_cost)
        .bind(reference)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }
}
