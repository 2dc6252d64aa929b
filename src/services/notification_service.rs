//! Fan-out de notificaciones
//!
//! Cada cambio en una solicitud genera notificaciones para las partes
//! interesadas. Se envían después del commit y un fallo aquí no deshace
//! la transición: solo se registra.

use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{AmbulanceRequest, HospitalResponse, NewNotification, UserRole};
use crate::repositories::notification_repository::NotificationRepository;

pub const KIND_REQUEST_CREATED: &str = "ambulance_request_created";
pub const KIND_REQUEST_ASSIGNED: &str = "ambulance_request_assigned";
pub const KIND_STATUS_CHANGED: &str = "ambulance_status_changed";
pub const KIND_REQUEST_FORWARDED: &str = "ambulance_request_forwarded";
pub const KIND_HOSPITAL_RESPONSE: &str = "hospital_response";
pub const KIND_AMBULANCE_ASSIGNED: &str = "ambulance_assigned";

pub struct NotificationService {
    repository: NotificationRepository,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool),
        }
    }

    async fn send_to_users(&self, recipients: Vec<Uuid>, notification: NewNotification) {
        let mut recipients = recipients;
        recipients.sort();
        recipients.dedup();

        match self.repository.insert_for_users(&recipients, &notification).await {
            Ok(count) => debug!("🔔 {} notificaciones '{}' enviadas", count, notification.kind),
            Err(e) => warn!("⚠️ No se pudo notificar '{}': {}", notification.kind, e),
        }
    }

    async fn send_to_roles(&self, roles: &[UserRole], notification: NewNotification) {
        match self.repository.insert_for_roles(roles, &notification).await {
            Ok(count) => debug!("🔔 {} notificaciones '{}' enviadas", count, notification.kind),
            Err(e) => warn!("⚠️ No se pudo notificar '{}': {}", notification.kind, e),
        }
    }

    pub async fn request_created(&self, request: &AmbulanceRequest) {
        let notification = NewNotification::for_request(
            KIND_REQUEST_CREATED,
            request.id,
            "New ambulance request",
            format!(
                "{} priority {} request for {} at {}",
                priority_label(request),
                request.emergency_type,
                request.patient_name,
                request.pickup_address
            ),
        );
        self.send_to_roles(&[UserRole::Staff, UserRole::Admin], notification)
            .await;
    }

    pub async fn request_claimed(&self, request: &AmbulanceRequest, staff_name: &str) {
        let notification = NewNotification::for_request(
            KIND_REQUEST_ASSIGNED,
            request.id,
            "Ambulance request assigned",
            format!("{} is handling your ambulance request", staff_name),
        );
        self.send_to_users(vec![request.requester_id], notification)
            .await;
    }

    pub async fn status_changed(&self, request: &AmbulanceRequest) {
        let notification = NewNotification::for_request(
            KIND_STATUS_CHANGED,
            request.id,
            "Ambulance request updated",
            format!("Your ambulance request is now {}", request.status),
        );
        self.send_to_users(vec![request.requester_id], notification)
            .await;
    }

    pub async fn request_forwarded(&self, request: &AmbulanceRequest, hospital_id: Uuid) {
        let notification = NewNotification::for_request(
            KIND_REQUEST_FORWARDED,
            request.id,
            "Ambulance request forwarded",
            format!(
                "{} request for {} awaits your response",
                request.emergency_type, request.patient_name
            ),
        );
        self.send_to_users(vec![hospital_id], notification).await;
    }

    pub async fn hospital_responded(&self, request: &AmbulanceRequest, hospital_name: &str) {
        let verdict = match request.hospital_response {
            Some(HospitalResponse::Accepted) => "accepted",
            Some(HospitalResponse::Rejected) => "rejected",
            _ => return,
        };
        let mut recipients = vec![request.requester_id];
        recipients.extend(request.forwarded_by);

        let notification = NewNotification::for_request(
            KIND_HOSPITAL_RESPONSE,
            request.id,
            format!("Hospital {}", verdict),
            format!("{} {} the ambulance request", hospital_name, verdict),
        );
        self.send_to_users(recipients, notification).await;
    }

    pub async fn ambulance_assigned(&self, request: &AmbulanceRequest, registration_number: &str) {
        let notification = NewNotification::for_request(
            KIND_AMBULANCE_ASSIGNED,
            request.id,
            "Ambulance dispatched",
            format!("Ambulance {} has been assigned to your request", registration_number),
        );
        self.send_to_users(vec![request.requester_id], notification)
            .await;
    }
}

fn priority_label(request: &AmbulanceRequest) -> &'static str {
    use crate::models::Priority;
    match request.priority {
        Priority::Critical => "Critical",
        Priority::High => "High",
        Priority::Normal => "Normal",
        Priority::Low => "Low",
    }
}
