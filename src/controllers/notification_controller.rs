use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Actor, NotificationList};
use crate::repositories::notification_repository::NotificationRepository;
use crate::utils::errors::{not_found_error, AppError};

const NOTIFICATION_PAGE_SIZE: i64 = 50;

pub struct NotificationController {
    repository: NotificationRepository,
}

impl NotificationController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool),
        }
    }

    pub async fn list(&self, actor: &Actor) -> Result<NotificationList, AppError> {
        let notifications = self
            .repository
            .list_for_user(actor.user_id, NOTIFICATION_PAGE_SIZE)
            .await?;
        let unread_count = self.repository.unread_count(actor.user_id).await?;

        Ok(NotificationList {
            notifications,
            unread_count,
        })
    }

    pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        if !self.repository.mark_read(id, actor.user_id).await? {
            return Err(not_found_error("Notification", &id));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, actor: &Actor) -> Result<u64, AppError> {
        self.repository.mark_all_read(actor.user_id).await
    }
}
