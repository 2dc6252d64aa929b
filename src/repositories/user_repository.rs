use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{User, UserRole};
use crate::utils::errors::AppError;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, phone, role, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    /// Rol de un usuario, si existe
    pub async fn find_role(&self, id: Uuid) -> Result<Option<UserRole>, AppError> {
        let role: Option<(UserRole,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role.map(|r| r.0))
    }

    pub async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        // Un único token vivo por usuario
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO password_resets (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Consumir un token de reseteo y fijar el nuevo hash. Devuelve `false`
    /// si el token no existe o ha caducado.
    pub async fn reset_password(&self, token: &str, password_hash: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(user_id) = Self::take_reset_token(&mut tx, token).await? else {
            // Los tokens caducados también se consumen
            tx.commit().await?;
            return Ok(false);
        };

        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn take_reset_token(conn: &mut PgConnection, token: &str) -> Result<Option<Uuid>, AppError> {
        let row: Option<(Uuid, DateTime<Utc>)> = sqlx::query_as(
            "DELETE FROM password_resets WHERE token = $1 RETURNING user_id, expires_at",
        )
        .bind(token)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user_id, _)| user_id))
    }
}
