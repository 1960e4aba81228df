// src/db/purchase_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::purchase::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus},
};

#[derive(Clone)]
pub struct PurchaseRepository {
    pool: PgPool,
}

impl PurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        po_number: &str,
        supplier_id: Uuid,
        branch_id: Uuid,
        expected_delivery_date: Option<NaiveDate>,
        sub_total: Decimal,
        total_amount: Decimal,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders
                (po_number, supplier_id, branch_id, expected_delivery_date,
                 sub_total, total_amount, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(po_number)
        .bind(supplier_id)
        .bind(branch_id)
        .bind(expected_delivery_date)
        .bind(sub_total)
        .bind(total_amount)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
        product_id: Uuid,
        ordered_quantity: i32,
        unit_cost: Decimal,
        line_total: Decimal,
    ) -> Result<PurchaseOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            INSERT INTO purchase_order_items
                (purchase_order_id, product_id, ordered_quantity, unit_cost, line_total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(purchase_order_id)
        .bind(product_id)
        .bind(ordered_quantity)
        .bind(unit_cost)
        .bind(line_total)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PurchaseOrder>, AppError> {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    // Trava a linha do pedido durante transições de estado / recebimento.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<PurchaseOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn items_for_order<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            "SELECT * FROM purchase_order_items WHERE purchase_order_id = $1",
        )
        .bind(purchase_order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn items_for_order_pool(
        &self,
        purchase_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderItem>, AppError> {
        self.items_for_order(&self.pool, purchase_order_id).await
    }

    pub async fn find_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<PurchaseOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            "SELECT * FROM purchase_order_items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    pub async fn add_received_quantity<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<PurchaseOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            UPDATE purchase_order_items
            SET received_quantity = received_quantity + $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: PurchaseOrderStatus,
        notes: Option<&str>,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = $2, notes = COALESCE($3, notes), updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list(
        &self,
        supplier_id: Option<Uuid>,
        branch_id: Option<Uuid>,
        status: Option<PurchaseOrderStatus>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT * FROM purchase_orders
            WHERE ($1::uuid IS NULL OR supplier_id = $1)
              AND ($2::uuid IS NULL OR branch_id = $2)
              AND ($3::po_status IS NULL OR status = $3)
              AND ($4::date IS NULL OR order_date::date >= $4)
              AND ($5::date IS NULL OR order_date::date <= $5)
            ORDER BY order_date DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(supplier_id)
        .bind(branch_id)
        .bind(status)
        .bind(start_date)
        .bind(end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }
}
