// src/db/customer_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{Customer, LoyaltyTransaction, LoyaltyTransactionType},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn find_by_id_pool(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        self.find_by_id(&self.pool, id).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        customer_code: Option<&str>,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        date_of_birth: Option<NaiveDate>,
    ) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers
                (customer_code, first_name, last_name, email, phone, address, date_of_birth)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(customer_code)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(phone)
        .bind(address)
        .bind(date_of_birth)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::CustomerAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn update(&self, customer: &Customer) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET customer_code = $2, first_name = $3, last_name = $4, email = $5,
                phone = $6, address = $7, date_of_birth = $8, is_active = $9,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.customer_code)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.date_of_birth)
        .bind(customer.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::CustomerAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        only_active: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, AppError> {
        let pattern = search.map(|s| format!("%{s}%"));
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1::text IS NULL
                   OR first_name ILIKE $1 OR last_name ILIKE $1
                   OR email ILIKE $1 OR customer_code ILIKE $1 OR phone ILIKE $1)
              AND (NOT $2 OR is_active = TRUE)
            ORDER BY first_name ASC, last_name ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(pattern)
        .bind(only_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "UPDATE customers SET is_active = FALSE, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    // ---
    // Fidelidade: saldo + razão mudam juntos, na transação do chamador.
    // ---

    /// Aplica um delta de pontos e de total comprado no saldo do cliente.
    pub async fn apply_loyalty_delta<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        points_delta: i32,
        purchases_delta: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET loyalty_points = loyalty_points + $2,
                total_purchases = total_purchases + $3,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(points_delta)
        .bind(purchases_delta)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    pub async fn insert_loyalty_transaction<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        sale_id: Option<Uuid>,
        transaction_type: LoyaltyTransactionType,
        points: i32,
        description: &str,
    ) -> Result<LoyaltyTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, LoyaltyTransaction>(
            r#"
            INSERT INTO loyalty_transactions
                (customer_id, sale_id, transaction_type, points, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(sale_id)
        .bind(transaction_type)
        .bind(points)
        .bind(description)
        .fetch_one(executor)
        .await?;
        Ok(transaction)
    }

    /// Acha o EARNED de uma venda (para o estorno reverter exatamente esses pontos).
    pub async fn find_earned_for_sale<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<LoyaltyTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, LoyaltyTransaction>(
            r#"
            SELECT * FROM loyalty_transactions
            WHERE customer_id = $1 AND sale_id = $2 AND transaction_type = 'EARNED'
            "#,
        )
        .bind(customer_id)
        .bind(sale_id)
        .fetch_optional(executor)
        .await?;
        Ok(transaction)
    }

    pub async fn recent_transactions(
        &self,
        customer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<LoyaltyTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, LoyaltyTransaction>(
            r#"
            SELECT * FROM loyalty_transactions
            WHERE customer_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }
}
