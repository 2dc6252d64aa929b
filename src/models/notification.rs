//! Modelo de Notification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Notification - mapea exactamente a la tabla notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub related_request_id: Option<Uuid>,
    pub unread: bool,
    pub created_at: DateTime<Utc>,
}

/// Borrador de notificación antes de elegir destinatarios
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: &'static str,
    pub related_request_id: Option<Uuid>,
}

impl NewNotification {
    pub fn for_request(kind: &'static str, request_id: Uuid, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            related_request_id: Some(request_id),
        }
    }
}

/// Listado de notificaciones con el contador de no leídas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}
