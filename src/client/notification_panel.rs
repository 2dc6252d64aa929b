//! Panel de notificaciones del cliente
//! 
//! Mantiene la lista y el contador de no leídas. Cada cambio del contador se
//! publica como `PanelEvent` a los suscriptores (badges, títulos, etc.).

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Notification, NotificationList};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Lista recargada desde el servidor
    Refreshed { unread_count: u64 },
    UnreadCountChanged(u64),
}

pub struct NotificationPanel {
    notifications: Vec<Notification>,
    unread_count: u64,
    events: broadcast::Sender<PanelEvent>,
}

impl Default for NotificationPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationPanel {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            notifications: Vec::new(),
            unread_count: 0,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    fn publish(&self, event: PanelEvent) {
        // Sin suscriptores el envío falla y no importa
        let _ = self.events.send(event);
    }

    /// Sustituir el contenido por lo último recibido del servidor
    pub fn replace(&mut self, list: NotificationList) {
        self.notifications = list.notifications;
        self.unread_count = u64::try_from(list.unread_count).unwrap_or(0);
        self.publish(PanelEvent::Refreshed {
            unread_count: self.unread_count,
        });
    }

    /// Marcar como leída localmente. Devuelve `false` si no existe o ya
    /// estaba leída; en ese caso el contador no cambia.
    pub fn mark_read_local(&mut self, id: Uuid) -> bool {
        let Some(notification) = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.unread)
        else {
            return false;
        };

        notification.unread = false;
        self.unread_count = self.unread_count.saturating_sub(1);
        self.publish(PanelEvent::UnreadCountChanged(self.unread_count));
        true
    }

    pub fn mark_all_read_local(&mut self) {
        for notification in &mut self.notifications {
            notification.unread = false;
        }
        self.unread_count = 0;
        self.publish(PanelEvent::UnreadCountChanged(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(unread: bool) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Nueva solicitud".to_string(),
            message: "Solicitud de ambulancia creada".to_string(),
            kind: "ambulance_request_created".to_string(),
            related_request_id: Some(Uuid::new_v4()),
            unread,
            created_at: Utc::now(),
        }
    }

    fn panel_with(items: Vec<Notification>, unread_count: i64) -> NotificationPanel {
        let mut panel = NotificationPanel::new();
        panel.replace(NotificationList {
            notifications: items,
            unread_count,
        });
        panel
    }

    #[test]
    fn test_mark_read_decrements_by_one() {
        let items = vec![notification(true), notification(true), notification(false)];
        let first = items[0].id;
        let mut panel = panel_with(items, 2);

        assert!(panel.mark_read_local(first));
        assert_eq!(panel.unread_count(), 1);
        assert!(!panel.notifications()[0].unread);
    }

    #[test]
    fn test_mark_read_twice_is_noop() {
        let items = vec![notification(true), notification(true)];
        let first = items[0].id;
        let mut panel = panel_with(items, 2);

        assert!(panel.mark_read_local(first));
        assert!(!panel.mark_read_local(first));
        assert_eq!(panel.unread_count(), 1);
    }

    #[test]
    fn test_counter_never_below_zero() {
        // Contador del servidor desfasado respecto de la lista
        let items = vec![notification(true)];
        let id = items[0].id;
        let mut panel = panel_with(items, 0);

        assert!(panel.mark_read_local(id));
        assert_eq!(panel.unread_count(), 0);
    }

    #[test]
    fn test_negative_server_count_clamps_to_zero() {
        let panel = panel_with(vec![], -3);
        assert_eq!(panel.unread_count(), 0);
    }

    #[test]
    fn test_mark_all_read() {
        let mut panel = panel_with(vec![notification(true), notification(true)], 2);
        panel.mark_all_read_local();

        assert_eq!(panel.unread_count(), 0);
        assert!(panel.notifications().iter().all(|n| !n.unread));
    }

    #[tokio::test]
    async fn test_events_published() {
        let items = vec![notification(true), notification(true)];
        let id = items[1].id;
        let mut panel = NotificationPanel::new();
        let mut events = panel.subscribe();

        panel.replace(NotificationList {
            notifications: items,
            unread_count: 2,
        });
        panel.mark_read_local(id);

        assert_eq!(events.recv().await.unwrap(), PanelEvent::Refreshed { unread_count: 2 });
        assert_eq!(events.recv().await.unwrap(), PanelEvent::UnreadCountChanged(1));
    }
}
