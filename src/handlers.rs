pub mod auth;
pub mod catalog;
pub mod customers;
pub mod inventory;
pub mod purchases;
pub mod sales;

use rust_decimal::Decimal;
use validator::ValidationError;

// Validação compartilhada: valores monetários (preços, descontos, alíquotas)
// nunca podem ser negativos.
pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// Paginação compartilhada pelos handlers de listagem.
pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_per_page() -> i64 {
    20
}

/// Converte (page, per_page) em (limit, offset), com per_page limitado a 100.
pub(crate) fn page_to_limit_offset(page: i64, per_page: i64) -> (i64, i64) {
    let per_page = per_page.clamp(1, 100);
    let page = page.max(1);
    (per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn negative_money_is_rejected() {
        assert!(validate_not_negative(&Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_not_negative(&Decimal::from_str("10.50").unwrap()).is_ok());
    }

    #[test]
    fn pagination_clamps_bad_input() {
        assert_eq!(page_to_limit_offset(1, 20), (20, 0));
        assert_eq!(page_to_limit_offset(3, 50), (50, 100));
        assert_eq!(page_to_limit_offset(0, 0), (1, 0));
        assert_eq!(page_to_limit_offset(-5, 1000), (100, 0));
    }
}
