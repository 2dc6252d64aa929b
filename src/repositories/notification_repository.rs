use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewNotification, Notification, UserRole};
use crate::utils::errors::AppError;

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insertar una copia de la notificación por destinatario
    pub async fn insert_for_users(
        &self,
        user_ids: &[Uuid],
        notification: &NewNotification,
    ) -> Result<u64, AppError> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, kind, related_request_id, unread, created_at)
            SELECT gen_random_uuid(), recipient, $2, $3, $4, $5, TRUE, NOW()
            FROM UNNEST($1::uuid[]) AS recipient
            "#,
        )
        .bind(user_ids)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.related_request_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Insertar una copia para cada usuario con alguno de los roles
    pub async fn insert_for_roles(
        &self,
        roles: &[UserRole],
        notification: &NewNotification,
    ) -> Result<u64, AppError> {
        let roles: Vec<&str> = roles.iter().map(UserRole::as_str).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, kind, related_request_id, unread, created_at)
            SELECT gen_random_uuid(), id, $2, $3, $4, $5, TRUE, NOW()
            FROM users
            WHERE role::text = ANY($1)
            "#,
        )
        .bind(&roles)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.related_request_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND unread")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    /// `false` si la notificación no existe o no pertenece al usuario
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET unread = FALSE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET unread = FALSE WHERE user_id = $1 AND unread")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
