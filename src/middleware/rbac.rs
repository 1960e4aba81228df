// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

/// 1. O trait que define um conjunto de papéis aceitos
pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
    /// Nome amigável para a mensagem de 403.
    fn describe() -> &'static str;
}

/// 2. O extractor (guardião): basta declará-lo como parâmetro do handler.
///    O papel já vem no usuário autenticado, então a checagem é local,
///    sem ida ao banco.
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o usuário colocado pelo auth_middleware
        let user = parts
            .extensions
            .get::<User>()
            .ok_or(AppError::InvalidToken)?;

        // B. Compara o papel com o conjunto permitido
        if !T::allowed().contains(&user.role) {
            return Err(AppError::Forbidden(T::describe()));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS CONJUNTOS DE PAPÉIS (TIPOS)
// ---

/// Somente Admin: aprovação de pedidos, ajuste de pontos, cadastros sensíveis.
pub struct AdminOnly;
impl RoleSet for AdminOnly {
    fn allowed() -> &'static [Role] {
        &[Role::Admin]
    }
    fn describe() -> &'static str {
        "Admin"
    }
}

/// Operação de caixa: registrar e estornar vendas.
pub struct SalesAccess;
impl RoleSet for SalesAccess {
    fn allowed() -> &'static [Role] {
        &[Role::Admin, Role::Cashier]
    }
    fn describe() -> &'static str {
        "Admin ou Cashier"
    }
}

/// Operação de estoque: ajustes, transferências e ciclo de compras.
pub struct StockAccess;
impl RoleSet for StockAccess {
    fn allowed() -> &'static [Role] {
        &[Role::Admin, Role::InventoryManager]
    }
    fn describe() -> &'static str {
        "Admin ou InventoryManager"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_in_every_role_set() {
        assert!(AdminOnly::allowed().contains(&Role::Admin));
        assert!(SalesAccess::allowed().contains(&Role::Admin));
        assert!(StockAccess::allowed().contains(&Role::Admin));
    }

    #[test]
    fn cashier_cannot_touch_stock() {
        assert!(SalesAccess::allowed().contains(&Role::Cashier));
        assert!(!StockAccess::allowed().contains(&Role::Cashier));
        assert!(!AdminOnly::allowed().contains(&Role::Cashier));
    }

    #[test]
    fn inventory_manager_cannot_sell() {
        assert!(StockAccess::allowed().contains(&Role::InventoryManager));
        assert!(!SalesAccess::allowed().contains(&Role::InventoryManager));
    }
}
