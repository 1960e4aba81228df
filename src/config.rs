// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{
        CatalogRepository, CustomerRepository, InventoryRepository, PurchaseRepository,
        SalesRepository, SettingsRepository, UserRepository,
    },
    services::{
        AuthService, CatalogService, CustomerService, InventoryService, PurchaseService,
        SalesService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub inventory_service: InventoryService,
    pub sales_service: SalesService,
    pub purchase_service: PurchaseService,
    pub customer_service: CustomerService,
}

impl AppState {
    // Carrega as configurações, abre o pool e monta os services
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;

        let db_pool = match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                pool
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao conectar ao banco de dados: {:?}", e);
                return Err(e.into());
            }
        };

        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let purchase_repo = PurchaseRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret, db_pool.clone());
        let catalog_service = CatalogService::new(db_pool.clone(), catalog_repo.clone());
        let inventory_service =
            InventoryService::new(db_pool.clone(), inventory_repo.clone(), catalog_repo.clone());
        let sales_service = SalesService::new(
            db_pool.clone(),
            sales_repo,
            inventory_repo.clone(),
            catalog_repo.clone(),
            customer_repo.clone(),
            settings_repo,
        );
        let purchase_service = PurchaseService::new(
            db_pool.clone(),
            purchase_repo,
            inventory_repo,
            catalog_repo,
        );
        let customer_service = CustomerService::new(db_pool.clone(), customer_repo);

        Ok(Self {
            db_pool,
            auth_service,
            catalog_service,
            inventory_service,
            sales_service,
            purchase_service,
            customer_service,
        })
    }
}
