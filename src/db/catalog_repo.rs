// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{Category, Product, Supplier},
        inventory::Branch,
    },
};

// Catálogo: produtos, categorias, fornecedores e filiais.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Filiais (só leitura: o seed cria a filial padrão, não há CRUD)
    // ---

    pub async fn find_branch(&self, id: Uuid) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(branch)
    }

    pub async fn find_active_branch(&self, id: Uuid) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(branch)
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
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (category_name, description, parent_category_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn update_category_parent(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        parent_id: Option<Uuid>,
    ) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET category_name = $2, description = $3, parent_category_id = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories ORDER BY category_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    // ---
    // Fornecedores
    // ---

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
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers
                (supplier_name, contact_person, email, phone, address, tax_number, payment_terms)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(contact_person)
        .bind(email)
        .bind(phone)
        .bind(address)
        .bind(tax_number)
        .bind(payment_terms)
        .fetch_one(&self.pool)
        .await?;
        Ok(supplier)
    }

    pub async fn update_supplier(&self, supplier: &Supplier) -> Result<Supplier, AppError> {
        let updated = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET supplier_name = $2, contact_person = $3, email = $4, phone = $5,
                address = $6, tax_number = $7, payment_terms = $8, is_active = $9,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.supplier_name)
        .bind(&supplier.contact_person)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.tax_number)
        .bind(&supplier.payment_terms)
        .bind(supplier.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    pub async fn find_supplier(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn get_all_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers ORDER BY supplier_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    // ---
    // Produtos
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create_product(
        &self,
        product_code: &str,
        barcode: Option<&str>,
        product_name: &str,
        description: Option<&str>,
        category_id: Uuid,
        supplier_id: Option<Uuid>,
        unit_of_measure: &str,
        cost_price: Decimal,
        selling_price: Decimal,
        min_stock_level: i32,
        max_stock_level: i32,
        reorder_level: i32,
        tax_rate: Decimal,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (product_code, barcode, product_name, description, category_id, supplier_id,
                 unit_of_measure, cost_price, selling_price, min_stock_level, max_stock_level,
                 reorder_level, tax_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(product_code)
        .bind(barcode)
        .bind(product_name)
        .bind(description)
        .bind(category_id)
        .bind(supplier_id)
        .bind(unit_of_measure)
        .bind(cost_price)
        .bind(selling_price)
        .bind(min_stock_level)
        .bind(max_stock_level)
        .bind(reorder_level)
        .bind(tax_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(map_product_unique_violation)
    }

    pub async fn update_product(&self, product: &Product) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET product_code = $2, barcode = $3, product_name = $4, description = $5,
                category_id = $6, supplier_id = $7, unit_of_measure = $8, cost_price = $9,
                selling_price = $10, min_stock_level = $11, max_stock_level = $12,
                reorder_level = $13, tax_rate = $14, is_active = $15, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.product_code)
        .bind(&product.barcode)
        .bind(&product.product_name)
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.supplier_id)
        .bind(&product.unit_of_measure)
        .bind(product.cost_price)
        .bind(product.selling_price)
        .bind(product.min_stock_level)
        .bind(product.max_stock_level)
        .bind(product.reorder_level)
        .bind(product.tax_rate)
        .bind(product.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_product_unique_violation)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn find_product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE barcode = $1 AND is_active = TRUE",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn list_products(
        &self,
        search: Option<&str>,
        category_id: Option<Uuid>,
        only_active: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, AppError> {
        let pattern = search.map(|s| format!("%{s}%"));
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL
                   OR product_name ILIKE $1 OR product_code ILIKE $1 OR barcode ILIKE $1)
              AND ($2::uuid IS NULL OR category_id = $2)
              AND (NOT $3 OR is_active = TRUE)
            ORDER BY product_name ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(pattern)
        .bind(category_id)
        .bind(only_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    // Exclusão lógica: o produto some do catálogo mas o histórico fica íntegro.
    pub async fn deactivate_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET is_active = FALSE, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }
}

fn map_product_unique_violation(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.contains("barcode") {
                return AppError::BarcodeAlreadyExists;
            }
            return AppError::ProductCodeAlreadyExists;
        }
    }
    e.into()
}
