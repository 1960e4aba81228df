// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, Role, UpdateUserPayload, User},
};

// Access token curto, refresh token longo. O refresh NÃO serve para acessar
// rotas protegidas: o middleware rejeita claims com refresh = true.
const ACCESS_TOKEN_HOURS: i64 = 24;
const REFRESH_TOKEN_DAYS: i64 = 30;

/// Usuário comum só enxerga e edita a própria conta; Admin, qualquer uma.
fn can_manage(actor: &User, target_id: Uuid) -> bool {
    actor.role == Role::Admin || actor.id == target_id
}

/// Papel e flag de ativação só mudam pela mão de um Admin. Para os demais,
/// o campo pedido é ignorado em silêncio e o valor atual permanece.
fn admin_only_field<T>(actor_role: Role, requested: Option<T>, current: T) -> T {
    match (actor_role, requested) {
        (Role::Admin, Some(value)) => value,
        _ => current,
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self {
            user_repo,
            jwt_secret,
            pool,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username_or_email(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // bcrypt é pesado; roda fora do executor async
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AppError::AccountDeactivated);
        }

        let access_token = self.create_token(user.id, false)?;
        let refresh_token = self.create_token(user.id, true)?;

        tracing::info!(username = %user.username, "Login efetuado");
        Ok(AuthResponse {
            access_token,
            refresh_token,
            user,
        })
    }

    /// Troca um refresh token válido por um novo access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let claims = self.decode_token(refresh_token)?;
        if !claims.refresh {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;
        if !user.is_active {
            return Err(AppError::AccountDeactivated);
        }

        let access_token = self.create_token(user.id, false)?;
        let new_refresh_token = self.create_token(user.id, true)?;
        Ok(AuthResponse {
            access_token,
            refresh_token: new_refresh_token,
            user,
        })
    }

    /// Cria um usuário novo (rota restrita a Admin; o RBAC fica no handler).
    #[allow(clippy::too_many_arguments)]
    pub async fn register_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
        is_active: bool,
    ) -> Result<User, AppError> {
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                username,
                email,
                &hashed_password,
                first_name,
                last_name,
                role,
                is_active,
            )
            .await?;

        tracing::info!(username = %user.username, role = ?user.role, "Usuário criado");
        Ok(user)
    }

    // ---
    // Administração de usuários
    // ---

    /// Listagem restrita a Admin (o RBAC fica no handler).
    pub async fn list_users(
        &self,
        search: Option<&str>,
        role: Option<Role>,
        only_active: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, AppError> {
        self.user_repo
            .list(search, role, only_active, limit, offset)
            .await
    }

    pub async fn get_user(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        if !can_manage(actor, id) {
            return Err(AppError::Forbidden("Admin"));
        }
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Atualização parcial: campos ausentes preservam o valor atual. Senha
    /// nova passa pelo bcrypt; papel e ativação só mudam se o ator for Admin.
    pub async fn update_user(
        &self,
        actor: &User,
        id: Uuid,
        update: UpdateUserPayload,
    ) -> Result<User, AppError> {
        if !can_manage(actor, id) {
            return Err(AppError::Forbidden("Admin"));
        }

        let existing = self
            .user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let password_hash = match update.password {
            Some(password) => {
                tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??
            }
            None => existing.password_hash.clone(),
        };

        let role = admin_only_field(actor.role, update.role, existing.role);
        let is_active = admin_only_field(actor.role, update.is_active, existing.is_active);

        let user = User {
            username: update.username.unwrap_or_else(|| existing.username.clone()),
            email: update.email.unwrap_or_else(|| existing.email.clone()),
            password_hash,
            first_name: update.first_name.unwrap_or_else(|| existing.first_name.clone()),
            last_name: update.last_name.unwrap_or_else(|| existing.last_name.clone()),
            role,
            is_active,
            ..existing
        };
        let updated = self.user_repo.update(&user).await?;

        tracing::info!(username = %updated.username, "Usuário atualizado");
        Ok(updated)
    }

    /// Exclusão lógica (somente Admin; o RBAC fica no handler). Ninguém
    /// desativa a própria conta.
    pub async fn deactivate_user(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        if actor.id == id {
            return Err(AppError::BadRequest(
                "Não é possível desativar a própria conta.".into(),
            ));
        }
        let user = self
            .user_repo
            .deactivate(id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(username = %user.username, "Usuário desativado");
        Ok(user)
    }

    /// Valida um ACCESS token e devolve o usuário ativo correspondente.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;
        if claims.refresh {
            // Refresh token não dá acesso direto às rotas
            return Err(AppError::InvalidToken);
        }

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;
        if !user.is_active {
            return Err(AppError::AccountDeactivated);
        }
        Ok(user)
    }

    /// Garante o admin inicial (admin/admin123) na primeira subida. O hash
    /// precisa do bcrypt, então isso roda aqui e não no seed SQL.
    pub async fn ensure_default_admin(&self) -> Result<(), AppError> {
        if self
            .user_repo
            .find_by_username_or_email("admin")
            .await?
            .is_some()
        {
            return Ok(());
        }

        self.register_user(
            "admin",
            "admin@possystem.local",
            "admin123",
            "System",
            "Administrator",
            Role::Admin,
            true,
        )
        .await?;

        tracing::warn!("⚠️ Usuário admin padrão criado (admin/admin123) — troque a senha!");
        Ok(())
    }

    fn create_token(&self, user_id: Uuid, refresh: bool) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = if refresh {
            now + chrono::Duration::days(REFRESH_TOKEN_DAYS)
        } else {
            now + chrono::Duration::hours(ACCESS_TOKEN_HOURS)
        };

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            refresh,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "operador".into(),
            email: "operador@possystem.local".into(),
            password_hash: "$2b$12$hash".into(),
            first_name: "Nome".into(),
            last_name: "Sobrenome".into(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_manages_any_account() {
        let admin = user_with_role(Role::Admin);
        assert!(can_manage(&admin, Uuid::new_v4()));
    }

    #[test]
    fn non_admin_manages_only_own_account() {
        let cashier = user_with_role(Role::Cashier);
        assert!(can_manage(&cashier, cashier.id));
        assert!(!can_manage(&cashier, Uuid::new_v4()));
    }

    #[test]
    fn role_change_requires_admin_actor() {
        // Pedido de um não-Admin é ignorado, não rejeitado
        assert_eq!(
            admin_only_field(Role::Cashier, Some(Role::Admin), Role::Cashier),
            Role::Cashier
        );
        assert_eq!(
            admin_only_field(Role::Admin, Some(Role::InventoryManager), Role::Cashier),
            Role::InventoryManager
        );
    }

    #[test]
    fn activation_change_requires_admin_actor() {
        assert!(admin_only_field(Role::InventoryManager, Some(false), true));
        assert!(!admin_only_field(Role::Admin, Some(false), true));
        // Campo ausente preserva o atual, mesmo para Admin
        assert!(admin_only_field::<bool>(Role::Admin, None, true));
    }

    #[test]
    fn role_labels_split_compound_names() {
        assert_eq!(Role::InventoryManager.label(), "Inventory Manager");
        assert_eq!(Role::Admin.label(), "Admin");
        assert_eq!(Role::ALL.len(), 3);
    }
}
