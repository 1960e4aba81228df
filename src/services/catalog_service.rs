// src/services/catalog_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{Category, Product, Supplier},
};

// Profundidade máxima aceitável da árvore de categorias. Se a caminhada de
// ancestrais passar disso, já existe um ciclo gravado no banco.
const MAX_CATEGORY_DEPTH: usize = 64;

#[derive(Debug)]
pub struct ProductDraft {
    pub product_code: String,
    pub barcode: Option<String>,
    pub product_name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub unit_of_measure: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub min_stock_level: i32,
    pub max_stock_level: i32,
    pub reorder_level: i32,
    pub tax_rate: Decimal,
}

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    catalog_repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(pool: PgPool, catalog_repo: CatalogRepository) -> Self {
        Self { pool, catalog_repo }
    }

    // ---
    // Produtos
    // ---

    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, AppError> {
        self.catalog_repo
            .find_category(draft.category_id)
            .await?
            .ok_or(AppError::CategoryNotFound)?;
        if let Some(supplier_id) = draft.supplier_id {
            self.catalog_repo
                .find_supplier(supplier_id)
                .await?
                .ok_or(AppError::SupplierNotFound)?;
        }

        self.catalog_repo
            .create_product(
                &draft.product_code,
                draft.barcode.as_deref(),
                &draft.product_name,
                draft.description.as_deref(),
                draft.category_id,
                draft.supplier_id,
                &draft.unit_of_measure,
                draft.cost_price,
                draft.selling_price,
                draft.min_stock_level,
                draft.max_stock_level,
                draft.reorder_level,
                draft.tax_rate,
            )
            .await
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        draft: ProductDraft,
        is_active: Option<bool>,
    ) -> Result<Product, AppError> {
        let existing = self
            .catalog_repo
            .find_product(&self.pool, id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        self.catalog_repo
            .find_category(draft.category_id)
            .await?
            .ok_or(AppError::CategoryNotFound)?;
        if let Some(supplier_id) = draft.supplier_id {
            self.catalog_repo
                .find_supplier(supplier_id)
                .await?
                .ok_or(AppError::SupplierNotFound)?;
        }

        let product = Product {
            product_code: draft.product_code,
            barcode: draft.barcode,
            product_name: draft.product_name,
            description: draft.description,
            category_id: draft.category_id,
            supplier_id: draft.supplier_id,
            unit_of_measure: draft.unit_of_measure,
            cost_price: draft.cost_price,
            selling_price: draft.selling_price,
            min_stock_level: draft.min_stock_level,
            max_stock_level: draft.max_stock_level,
            reorder_level: draft.reorder_level,
            tax_rate: draft.tax_rate,
            is_active: crate::services::resolve_is_active(is_active, existing.is_active),
            ..existing
        };
        self.catalog_repo.update_product(&product).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.catalog_repo
            .find_product(&self.pool, id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    pub async fn get_product_by_barcode(&self, barcode: &str) -> Result<Product, AppError> {
        self.catalog_repo
            .find_product_by_barcode(barcode)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    pub async fn list_products(
        &self,
        search: Option<&str>,
        category_id: Option<Uuid>,
        only_active: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, AppError> {
        self.catalog_repo
            .list_products(search, category_id, only_active, limit, offset)
            .await
    }

    pub async fn deactivate_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.catalog_repo
            .deactivate_product(id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    // ---
    // Categorias
    // ---

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
        parent_id: Option<Uuid>,
    ) -> Result<Category, AppError> {
        if let Some(parent_id) = parent_id {
            self.catalog_repo
                .find_category(parent_id)
                .await?
                .ok_or(AppError::CategoryNotFound)?;
        }
        self.catalog_repo
            .create_category(name, description, parent_id)
            .await
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        parent_id: Option<Uuid>,
    ) -> Result<Category, AppError> {
        self.catalog_repo
            .find_category(id)
            .await?
            .ok_or(AppError::CategoryNotFound)?;

        if let Some(parent_id) = parent_id {
            self.ensure_no_cycle(id, parent_id).await?;
        }

        self.catalog_repo
            .update_category_parent(id, name, description, parent_id)
            .await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.catalog_repo.get_all_categories().await
    }

    /// Sobe a cadeia de ancestrais a partir do novo pai; se encontrar a
    /// própria categoria no caminho, a mudança criaria um ciclo.
    async fn ensure_no_cycle(&self, category_id: Uuid, new_parent_id: Uuid) -> Result<(), AppError> {
        if new_parent_id == category_id {
            return Err(AppError::CategoryCycle);
        }

        let mut cursor = Some(new_parent_id);
        let mut depth = 0;
        while let Some(current) = cursor {
            if depth >= MAX_CATEGORY_DEPTH {
                return Err(AppError::CategoryCycle);
            }
            let node = self
                .catalog_repo
                .find_category(current)
                .await?
                .ok_or(AppError::CategoryNotFound)?;
            if node.parent_category_id == Some(category_id) {
                return Err(AppError::CategoryCycle);
            }
            cursor = node.parent_category_id;
            depth += 1;
        }
        Ok(())
    }

    // ---
    // Fornecedores
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create_supplier(
        &self,
        name: &str,
        contact_person: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        tax_number: Option<&str>,
        payment_terms: Option<&str>,
    ) -> Result<Supplier, AppError> {
        self.catalog_repo
            .create_supplier(name, contact_person, email, phone, address, tax_number, payment_terms)
            .await
    }

    pub async fn update_supplier(&self, supplier: &Supplier) -> Result<Supplier, AppError> {
        self.catalog_repo
            .find_supplier(supplier.id)
            .await?
            .ok_or(AppError::SupplierNotFound)?;
        self.catalog_repo.update_supplier(supplier).await
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<Supplier, AppError> {
        self.catalog_repo
            .find_supplier(id)
            .await?
            .ok_or(AppError::SupplierNotFound)
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.catalog_repo.get_all_suppliers().await
    }
}
