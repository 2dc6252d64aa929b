//! Sondeo periódico de notificaciones

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, warn};

use super::{ApiClient, ClientResult, NotificationPanel};
use crate::models::NotificationList;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch_notifications(&self) -> ClientResult<NotificationList>;
}

#[async_trait]
impl NotificationSource for ApiClient {
    async fn fetch_notifications(&self) -> ClientResult<NotificationList> {
        self.list_notifications().await
    }
}

/// La tarea se cancela al soltar el handle
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Refresca `panel` cada `interval`; la primera carga es inmediata.
/// Un fallo se registra y se reintenta en el siguiente ciclo.
pub fn spawn_notification_poller<S>(
    source: Arc<S>,
    panel: Arc<Mutex<NotificationPanel>>,
    interval: Duration,
) -> PollerHandle
where
    S: NotificationSource + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match source.fetch_notifications().await {
                Ok(list) => {
                    debug!("🔔 {} notificaciones sin leer", list.unread_count);
                    panel.lock().await.replace(list);
                }
                Err(e) => warn!("⚠️ No se pudieron cargar las notificaciones: {}", e),
            }
        }
    });

    PollerHandle { task }
}
