// src/db/settings_repo.rs

use sqlx::PgPool;

use crate::common::error::AppError;

// Leitura de configurações do sistema. Não há CRUD exposto: o seed grava os
// valores e o backend só consome (ex.: LOYALTY_POINTS_RATE na venda).
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>, AppError> {
        let value: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT setting_value FROM system_settings WHERE setting_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value.and_then(|(v,)| v))
    }
}
