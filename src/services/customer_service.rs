// src/services/customer_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::{Customer, LoyaltyTransaction, LoyaltyTransactionType},
};

#[derive(Debug)]
pub struct CustomerDraft {
    pub customer_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

fn generate_customer_code() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("CUST-{suffix}")
}

#[derive(Clone)]
pub struct CustomerService {
    pool: PgPool,
    customer_repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(pool: PgPool, customer_repo: CustomerRepository) -> Self {
        Self {
            pool,
            customer_repo,
        }
    }

    pub async fn create_customer(&self, draft: CustomerDraft) -> Result<Customer, AppError> {
        let code = draft
            .customer_code
            .unwrap_or_else(generate_customer_code);

        self.customer_repo
            .create(
                Some(&code),
                &draft.first_name,
                &draft.last_name,
                draft.email.as_deref(),
                draft.phone.as_deref(),
                draft.address.as_deref(),
                draft.date_of_birth,
            )
            .await
    }

    pub async fn update_customer(
        &self,
        id: Uuid,
        draft: CustomerDraft,
        is_active: Option<bool>,
    ) -> Result<Customer, AppError> {
        let existing = self
            .customer_repo
            .find_by_id_pool(id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let customer = Customer {
            customer_code: draft.customer_code.or(existing.customer_code.clone()),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            date_of_birth: draft.date_of_birth,
            is_active: crate::services::resolve_is_active(is_active, existing.is_active),
            ..existing
        };
        self.customer_repo.update(&customer).await
    }

    pub async fn list_customers(
        &self,
        search: Option<&str>,
        only_active: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, AppError> {
        self.customer_repo
            .list(search, only_active, limit, offset)
            .await
    }

    pub async fn deactivate_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.customer_repo
            .deactivate(id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    /// Saldo + extrato recente de pontos do cliente.
    pub async fn loyalty_summary(
        &self,
        id: Uuid,
        limit: i64,
    ) -> Result<(Customer, Vec<LoyaltyTransaction>), AppError> {
        let customer = self
            .customer_repo
            .find_by_id_pool(id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        let transactions = self.customer_repo.recent_transactions(id, limit).await?;
        Ok((customer, transactions))
    }

    /// Ajuste manual de pontos (positivo ou negativo), sempre com o registro
    /// ADJUSTED no razão, na mesma transação do saldo.
    pub async fn adjust_loyalty_points(
        &self,
        id: Uuid,
        points: i32,
        reason: &str,
    ) -> Result<(Customer, LoyaltyTransaction), AppError> {
        if points == 0 {
            return Err(AppError::BadRequest(
                "O ajuste de pontos não pode ser zero.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        self.customer_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let customer = self
            .customer_repo
            .apply_loyalty_delta(&mut *tx, id, points, Decimal::ZERO)
            .await?;
        let transaction = self
            .customer_repo
            .insert_loyalty_transaction(
                &mut *tx,
                id,
                None,
                LoyaltyTransactionType::Adjusted,
                points,
                reason,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(customer_id = %id, points, "Pontos de fidelidade ajustados");
        Ok((customer, transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_code_has_expected_shape() {
        let code = generate_customer_code();
        assert!(code.starts_with("CUST-"));
        assert_eq!(code.len(), "CUST-".len() + 8);
    }
}
