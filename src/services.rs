pub mod auth;
pub use auth::AuthService;
pub mod catalog_service;
pub use catalog_service::CatalogService;
pub mod customer_service;
pub use customer_service::CustomerService;
pub mod inventory_service;
pub use inventory_service::InventoryService;
pub mod purchase_service;
pub use purchase_service::PurchaseService;
pub mod sales_service;
pub use sales_service::SalesService;

/// Resolve o flag de ativação em updates: o campo ausente preserva o valor
/// atual. A exclusão lógica (somente Admin) não é desfeita por um PUT comum.
pub(crate) fn resolve_is_active(requested: Option<bool>, current: bool) -> bool {
    requested.unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_without_flag_keeps_deactivated_record_inactive() {
        assert!(!resolve_is_active(None, false));
        assert!(resolve_is_active(None, true));
    }

    #[test]
    fn explicit_flag_wins() {
        assert!(resolve_is_active(Some(true), false));
        assert!(!resolve_is_active(Some(false), true));
    }
}
