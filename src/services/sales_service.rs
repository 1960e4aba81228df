// src/services/sales_service.rs

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, CustomerRepository, InventoryRepository, SalesRepository, SettingsRepository},
    models::{
        customer::LoyaltyTransactionType,
        inventory::MovementType,
        sales::{PaymentMethod, PaymentStatus, SaleItem, SaleWithItems},
    },
};

// ---
// Entrada da venda (o handler converte o payload HTTP para cá)
// ---

#[derive(Debug)]
pub struct SaleDraft {
    pub branch_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub items: Vec<SaleDraftLine>,
    pub payment_method: PaymentMethod,
    pub discount_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct SaleDraftLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub discount_amount: Decimal,
}

// ---
// Aritmética dos totais (pura, para dar para testar sem banco)
// ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// line_subtotal = unit_price*qty - desconto; imposto sobre o subtotal.
pub fn compute_line_totals(
    unit_price: Decimal,
    quantity: i32,
    discount: Decimal,
    tax_rate: Decimal,
) -> LineTotals {
    let subtotal = unit_price * Decimal::from(quantity) - discount;
    let tax = subtotal * tax_rate / Decimal::ONE_HUNDRED;
    LineTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// points = floor(total * taxa). Nunca negativo em venda normal.
pub fn loyalty_points_for(total_amount: Decimal, rate: Decimal) -> i32 {
    (total_amount * rate).floor().to_i32().unwrap_or(0)
}

/// Saldo disponível cobre a quantidade pedida? Linha ausente conta como zero.
fn covers_quantity(record: Option<&crate::models::inventory::InventoryRecord>, quantity: i32) -> bool {
    record.map(|r| r.available_stock).unwrap_or(0) >= quantity
}

/// Guarda do estorno: Refunded é terminal, um segundo estorno é rejeitado.
fn ensure_refundable(status: PaymentStatus) -> Result<(), AppError> {
    if status == PaymentStatus::Refunded {
        return Err(AppError::SaleAlreadyRefunded);
    }
    Ok(())
}

fn generate_sale_number() -> String {
    let today = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("SALE-{today}-{suffix}")
}

// ---
// Service
// ---

#[derive(Clone)]
pub struct SalesService {
    pool: PgPool,
    sales_repo: SalesRepository,
    inventory_repo: InventoryRepository,
    catalog_repo: CatalogRepository,
    customer_repo: CustomerRepository,
    settings_repo: SettingsRepository,
}

impl SalesService {
    pub fn new(
        pool: PgPool,
        sales_repo: SalesRepository,
        inventory_repo: InventoryRepository,
        catalog_repo: CatalogRepository,
        customer_repo: CustomerRepository,
        settings_repo: SettingsRepository,
    ) -> Self {
        Self {
            pool,
            sales_repo,
            inventory_repo,
            catalog_repo,
            customer_repo,
            settings_repo,
        }
    }

    /// Registra uma venda completa: cabeçalho + itens + baixa de estoque +
    /// movimentos OUT + pontos de fidelidade, tudo em UMA transação.
    /// Qualquer falha desfaz tudo — nada de baixa parcial.
    pub async fn create_sale(
        &self,
        cashier_id: Uuid,
        draft: SaleDraft,
    ) -> Result<SaleWithItems, AppError> {
        if draft.items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        self.catalog_repo
            .find_branch(draft.branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;

        if let Some(customer_id) = draft.customer_id {
            self.customer_repo
                .find_by_id_pool(customer_id)
                .await?
                .ok_or(AppError::CustomerNotFound)?;
        }

        // A taxa de fidelidade é configuração; fora da transação de escrita.
        let loyalty_rate = match self.settings_repo.get_value("LOYALTY_POINTS_RATE").await? {
            Some(raw) => raw.parse::<Decimal>().unwrap_or(Decimal::ONE),
            None => Decimal::ONE,
        };

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 1. Valida cada linha e trava o saldo (FOR UPDATE) antes de checar
        //    disponibilidade: sem o lock, duas vendas concorrentes do mesmo
        //    produto passariam as duas na checagem e venderiam a descoberto.
        let mut validated = Vec::with_capacity(draft.items.len());
        let mut sub_total = Decimal::ZERO;
        let mut total_tax = Decimal::ZERO;

        for line in &draft.items {
            if line.quantity <= 0 {
                return Err(AppError::BadRequest("Quantidade do item deve ser positiva.".into()));
            }

            let product = self
                .catalog_repo
                .find_product(&mut *tx, line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or(AppError::ProductNotFound)?;

            let unit_price = line.unit_price.unwrap_or(product.selling_price);

            let record = self
                .inventory_repo
                .get_record_for_update(&mut *tx, product.id, draft.branch_id)
                .await?;

            if !covers_quantity(record.as_ref(), line.quantity) {
                // Erro aqui desfaz a transação inteira: nenhuma venda parcial
                // nem baixa de estoque sobrevive.
                return Err(AppError::InsufficientStock(product.product_name));
            }

            let totals = compute_line_totals(
                unit_price,
                line.quantity,
                line.discount_amount,
                product.tax_rate,
            );

            sub_total += totals.subtotal;
            total_tax += totals.tax;
            validated.push((product, unit_price, totals, line));
        }

        let total_amount = sub_total + total_tax - draft.discount_amount;
        let sale_number = generate_sale_number();

        // 2. Cabeçalho + itens
        let sale = self
            .sales_repo
            .insert_sale(
                &mut *tx,
                &sale_number,
                draft.customer_id,
                draft.branch_id,
                cashier_id,
                sub_total,
                total_tax,
                draft.discount_amount,
                total_amount,
                draft.payment_method,
                draft.notes.as_deref(),
            )
            .await?;

        let mut items: Vec<SaleItem> = Vec::with_capacity(validated.len());
        for (product, unit_price, totals, line) in &validated {
            let item = self
                .sales_repo
                .insert_item(
                    &mut *tx,
                    sale.id,
                    product.id,
                    line.quantity,
                    *unit_price,
                    line.discount_amount,
                    totals.tax,
                    totals.total,
                )
                .await?;
            items.push(item);
        }

        // 3. Baixa do estoque + movimento OUT por linha, referenciando o
        //    próprio número da venda
        for (product, _, _, line) in &validated {
            self.inventory_repo
                .apply_stock_delta(&mut *tx, product.id, draft.branch_id, -line.quantity)
                .await?;
            self.inventory_repo
                .record_movement(
                    &mut *tx,
                    product.id,
                    draft.branch_id,
                    MovementType::Out,
                    -line.quantity,
                    None,
                    Some(&sale_number),
                    Some("Venda"),
                    cashier_id,
                )
                .await?;
        }

        // 4. Fidelidade (se houver cliente)
        if let Some(customer_id) = draft.customer_id {
            let points = loyalty_points_for(total_amount, loyalty_rate);
            if points > 0 {
                self.customer_repo
                    .apply_loyalty_delta(&mut *tx, customer_id, points, total_amount)
                    .await?;
                self.customer_repo
                    .insert_loyalty_transaction(
                        &mut *tx,
                        customer_id,
                        Some(sale.id),
                        LoyaltyTransactionType::Earned,
                        points,
                        &format!("Pontos ganhos na venda {sale_number}"),
                    )
                    .await?;
            }
        }

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(sale_number = %sale.sale_number, total = %sale.total_amount, "Venda registrada");
        Ok(SaleWithItems { sale, items })
    }

    /// Estorno: marca Refunded (uma única vez), devolve o estoque de cada
    /// linha com movimentos IN e reverte exatamente os pontos ganhos.
    pub async fn refund_sale(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
        reason: &str,
    ) -> Result<SaleWithItems, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .sales_repo
            .find_by_id_for_update(&mut *tx, sale_id)
            .await?
            .ok_or(AppError::SaleNotFound)?;

        ensure_refundable(sale.payment_status)?;

        let items = self.sales_repo.items_for_sale(&mut *tx, sale.id).await?;

        let notes = format!(
            "{} | REFUNDED: {reason}",
            sale.notes.clone().unwrap_or_default()
        );
        let updated = self
            .sales_repo
            .mark_refunded(&mut *tx, sale.id, Some(&notes))
            .await?;

        let reference = format!("REFUND-{}", sale.sale_number);
        for item in &items {
            self.inventory_repo
                .apply_stock_delta(&mut *tx, item.product_id, sale.branch_id, item.quantity)
                .await?;
            self.inventory_repo
                .record_movement(
                    &mut *tx,
                    item.product_id,
                    sale.branch_id,
                    MovementType::In,
                    item.quantity,
                    None,
                    Some(&reference),
                    Some(&format!("Estorno da venda {}", sale.sale_number)),
                    user_id,
                )
                .await?;
        }

        if let Some(customer_id) = sale.customer_id {
            // Reverte só se houve EARNED para esta venda, e exatamente aquele valor.
            if let Some(earned) = self
                .customer_repo
                .find_earned_for_sale(&mut *tx, customer_id, sale.id)
                .await?
            {
                self.customer_repo
                    .apply_loyalty_delta(&mut *tx, customer_id, -earned.points, -sale.total_amount)
                    .await?;
                self.customer_repo
                    .insert_loyalty_transaction(
                        &mut *tx,
                        customer_id,
                        Some(sale.id),
                        LoyaltyTransactionType::Adjusted,
                        -earned.points,
                        &format!("Pontos revertidos pelo estorno da venda {}", sale.sale_number),
                    )
                    .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(sale_number = %updated.sale_number, "Venda estornada");
        Ok(SaleWithItems { sale: updated, items })
    }

    pub async fn get_sale(&self, sale_id: Uuid) -> Result<SaleWithItems, AppError> {
        let sale = self
            .sales_repo
            .find_by_id(sale_id)
            .await?
            .ok_or(AppError::SaleNotFound)?;
        let items = self.sales_repo.items_for_sale_pool(sale.id).await?;
        Ok(SaleWithItems { sale, items })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list_sales(
        &self,
        branch_id: Option<Uuid>,
        cashier_id: Option<Uuid>,
        payment_method: Option<PaymentMethod>,
        start_date: Option<chrono::NaiveDate>,
        end_date: Option<chrono::NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<crate::models::sales::Sale>, AppError> {
        self.sales_repo
            .list(branch_id, cashier_id, payment_method, start_date, end_date, limit, offset)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // Cenário de referência: 10 un a 10.00 com 8.5% de imposto.
    #[test]
    fn line_totals_with_tax() {
        let totals = compute_line_totals(dec("10.00"), 10, Decimal::ZERO, dec("8.5"));
        assert_eq!(totals.subtotal, dec("100.00"));
        assert_eq!(totals.tax, dec("8.500"));
        assert_eq!(totals.total, dec("108.500"));
    }

    #[test]
    fn line_discount_applies_before_tax() {
        // 2 x 50.00 com 10.00 de desconto e 10% de imposto:
        // subtotal 90.00, imposto 9.00, total 99.00
        let totals = compute_line_totals(dec("50.00"), 2, dec("10.00"), dec("10"));
        assert_eq!(totals.subtotal, dec("90.00"));
        assert_eq!(totals.tax, dec("9.000"));
        assert_eq!(totals.total, dec("99.000"));
    }

    #[test]
    fn zero_tax_rate_keeps_total_equal_to_subtotal() {
        let totals = compute_line_totals(dec("3.50"), 4, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(totals.subtotal, dec("14.00"));
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, dec("14.00"));
    }

    #[test]
    fn loyalty_points_floor() {
        assert_eq!(loyalty_points_for(dec("108.50"), Decimal::ONE), 108);
        assert_eq!(loyalty_points_for(dec("99.99"), dec("0.5")), 49);
        assert_eq!(loyalty_points_for(dec("0.99"), Decimal::ONE), 0);
    }

    #[test]
    fn sale_number_has_expected_shape() {
        let number = generate_sale_number();
        assert!(number.starts_with("SALE-"));
        // SALE- + AAAAMMDD + '-' + 8 hex maiúsculos
        assert_eq!(number.len(), "SALE-".len() + 8 + 1 + 8);
        // O número vai direto para a referência do movimento; o prefixo
        // aparece uma vez só.
        assert_eq!(number.matches("SALE-").count(), 1);
    }

    fn record_with(current: i32, reserved: i32) -> crate::models::inventory::InventoryRecord {
        crate::models::inventory::InventoryRecord {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            current_stock: current,
            reserved_stock: reserved,
            available_stock: current - reserved,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn missing_inventory_row_never_covers_a_sale() {
        assert!(!covers_quantity(None, 1));
        assert!(covers_quantity(None, 0));
    }

    #[test]
    fn reserved_stock_does_not_count_as_available() {
        let record = record_with(10, 4);
        assert!(covers_quantity(Some(&record), 6));
        assert!(!covers_quantity(Some(&record), 7));
    }

    #[test]
    fn refund_rejected_only_when_already_refunded() {
        assert!(ensure_refundable(PaymentStatus::Completed).is_ok());
        assert!(ensure_refundable(PaymentStatus::Pending).is_ok());
        assert!(matches!(
            ensure_refundable(PaymentStatus::Refunded),
            Err(AppError::SaleAlreadyRefunded)
        ));
    }
}
