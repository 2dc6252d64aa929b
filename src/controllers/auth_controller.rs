use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::config::EnvironmentConfig;
use crate::dto::auth_dto::{
    ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest,
};
use crate::models::{Actor, User, UserResponse, UserRole};
use crate::repositories::user_repository::UserRepository;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, AppError};
use crate::utils::jwt::{generate_token, JwtConfig};
use crate::utils::validation::{generate_reset_token, normalize_optional};

const FORGOT_PASSWORD_MESSAGE: &str =
    "If the email is registered, password reset instructions have been sent";

pub struct AuthController {
    repository: UserRepository,
    jwt: JwtConfig,
    config: Arc<EnvironmentConfig>,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: UserRepository::new(state.pool.clone()),
            jwt: state.jwt.clone(),
            config: state.config.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        request.validate()?;

        let role = request.role.unwrap_or(UserRole::Customer);
        if role == UserRole::Admin {
            return Err(AppError::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }
        if !self.config.allows_self_registration(role) {
            return Err(AppError::Forbidden(format!(
                "The {} role cannot be self-registered; ask an administrator",
                role
            )));
        }

        let email = request.email.trim().to_lowercase();
        if self.repository.email_exists(&email).await? {
            return Err(conflict_error("User", "email", &email));
        }

        // Hash de la contraseña
        let password_hash = hash(&request.password, DEFAULT_COST)?;

        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            phone: normalize_optional(request.phone),
            role,
            password_hash,
            created_at: Utc::now(),
        };

        let saved = self.repository.create(&user).await?;
        info!("👤 Usuario {} registrado como {}", saved.id, saved.role);

        Ok(saved.into())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let user = self
            .repository
            .find_by_email(request.email.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Credenciales inválidas".to_string()))?;

        // Verificar contraseña
        if !verify(&request.password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Credenciales inválidas".to_string()));
        }

        let actor = Actor::new(user.id, user.role, user.name);
        let token = generate_token(&actor, &self.jwt)?;

        Ok(LoginResponse {
            token,
            user_id: actor.user_id,
            role: actor.role,
            name: actor.name,
        })
    }

    /// Siempre responde igual para no revelar qué emails existen
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<ForgotPasswordResponse, AppError> {
        request.validate()?;

        let mut reset_token = None;
        if let Some(user) = self.repository.find_by_email(request.email.trim()).await? {
            let token = generate_reset_token();
            let expires_at = Utc::now() + Duration::minutes(self.config.reset_token_ttl_minutes);
            self.repository
                .store_reset_token(user.id, &token, expires_at)
                .await?;
            info!("🔑 Token de reseteo emitido para {}", user.id);

            if self.config.is_development() {
                reset_token = Some(token);
            }
        }

        Ok(ForgotPasswordResponse {
            message: FORGOT_PASSWORD_MESSAGE.to_string(),
            reset_token,
        })
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AppError> {
        request.validate()?;

        let password_hash = hash(&request.new_password, DEFAULT_COST)?;
        if !self
            .repository
            .reset_password(request.token.trim(), &password_hash)
            .await?
        {
            return Err(AppError::BadRequest(
                "Invalid or expired reset token".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn me(&self, actor: &Actor) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Usuario no encontrado".to_string()))?;

        Ok(user.into())
    }
}
