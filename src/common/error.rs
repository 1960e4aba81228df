use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Taxonomia: validação/conflito -> 400, não encontrado -> 404,
// credencial -> 401, papel insuficiente -> 403, resto -> 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("A venda precisa de pelo menos um item")]
    EmptyCart,

    #[error("Estoque insuficiente para o produto '{0}'")]
    InsufficientStock(String),

    #[error("Filial de origem e destino não podem ser a mesma")]
    InvalidTransfer,

    #[error("Tipo de movimentação inválido para esta operação")]
    InvalidMovementType,

    #[error("{0}")]
    InvalidStateTransition(String),

    #[error("Venda já estornada")]
    SaleAlreadyRefunded,

    #[error("Categoria pai inválida: criaria um ciclo")]
    CategoryCycle,

    #[error("Código de produto já existe")]
    ProductCodeAlreadyExists,

    #[error("Código de barras já existe")]
    BarcodeAlreadyExists,

    #[error("Username ou e-mail já existe")]
    UserAlreadyExists,

    #[error("E-mail ou código de cliente já existe")]
    CustomerAlreadyExists,

    #[error("Produto não encontrado ou inativo")]
    ProductNotFound,

    #[error("Filial não encontrada")]
    BranchNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    #[error("Fornecedor não encontrado ou inativo")]
    SupplierNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Venda não encontrada")]
    SaleNotFound,

    #[error("Pedido de compra não encontrado")]
    PurchaseOrderNotFound,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Conta desativada")]
    AccountDeactivated,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado: requer papel {0}")]
    Forbidden(&'static str),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_)
            | Self::BadRequest(_)
            | Self::EmptyCart
            | Self::InsufficientStock(_)
            | Self::InvalidTransfer
            | Self::InvalidMovementType
            | Self::InvalidStateTransition(_)
            | Self::SaleAlreadyRefunded
            | Self::CategoryCycle
            | Self::ProductCodeAlreadyExists
            | Self::BarcodeAlreadyExists
            | Self::UserAlreadyExists
            | Self::CustomerAlreadyExists => StatusCode::BAD_REQUEST,

            Self::ProductNotFound
            | Self::BranchNotFound
            | Self::CategoryNotFound
            | Self::SupplierNotFound
            | Self::CustomerNotFound
            | Self::SaleNotFound
            | Self::PurchaseOrderNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            Self::InvalidCredentials | Self::AccountDeactivated | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }

            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            Self::DatabaseError(_)
            | Self::InternalServerError(_)
            | Self::BcryptError(_)
            | Self::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Validação devolve todos os detalhes por campo.
        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let status = self.status_code();

        // Erros 5xx não vazam detalhe para o cliente; o tracing guarda a causa.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {self}");
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_validation_map_to_400() {
        assert_eq!(
            AppError::InsufficientStock("Coffee".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidStateTransition("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ProductCodeAlreadyExists.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn not_found_auth_and_role_codes() {
        assert_eq!(AppError::ProductNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AccountDeactivated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("Admin").status_code(), StatusCode::FORBIDDEN);
    }
}
