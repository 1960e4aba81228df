// src/db/sales_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sales::{PaymentMethod, PaymentStatus, Sale, SaleItem},
};

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        sale_number: &str,
        customer_id: Option<Uuid>,
        branch_id: Uuid,
        cashier_id: Uuid,
        sub_total: Decimal,
        tax_amount: Decimal,
        discount_amount: Decimal,
        total_amount: Decimal,
        payment_method: PaymentMethod,
        notes: Option<&str>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales
                (sale_number, customer_id, branch_id, cashier_id, sub_total, tax_amount,
                 discount_amount, total_amount, payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(sale_number)
        .bind(customer_id)
        .bind(branch_id)
        .bind(cashier_id)
        .bind(sub_total)
        .bind(tax_amount)
        .bind(discount_amount)
        .bind(total_amount)
        .bind(payment_method)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        discount_amount: Decimal,
        tax_amount: Decimal,
        line_total: Decimal,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items
                (sale_id, product_id, quantity, unit_price, discount_amount, tax_amount, line_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(discount_amount)
        .bind(tax_amount)
        .bind(line_total)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, AppError> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Busca travando a linha da venda: o guard de "já estornada" depende disso
    /// para dois estornos concorrentes não passarem os dois.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn items_for_sale<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = $1",
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn items_for_sale_pool(&self, sale_id: Uuid) -> Result<Vec<SaleItem>, AppError> {
        self.items_for_sale(&self.pool, sale_id).await
    }

    pub async fn mark_refunded<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        notes: Option<&str>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            "UPDATE sales SET payment_status = $2, notes = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(PaymentStatus::Refunded)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list(
        &self,
        branch_id: Option<Uuid>,
        cashier_id: Option<Uuid>,
        payment_method: Option<PaymentMethod>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::uuid IS NULL OR cashier_id = $2)
              AND ($3::payment_method IS NULL OR payment_method = $3)
              AND ($4::date IS NULL OR sale_date::date >= $4)
              AND ($5::date IS NULL OR sale_date::date <= $5)
            ORDER BY sale_date DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(branch_id)
        .bind(cashier_id)
        .bind(payment_method)
        .bind(start_date)
        .bind(end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }
}
