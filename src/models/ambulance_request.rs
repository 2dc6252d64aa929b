//! Modelo de AmbulanceRequest
//!
//! Solicitud de servicio de ambulancia y sus estados. Mapea a la tabla
//! ambulance_requests y a los ENUM request_status, request_priority y
//! hospital_response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Estado de la solicitud - mapea al ENUM request_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Assigned,
    OnTheWay,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Assigned => "assigned",
            RequestStatus::OnTheWay => "on_the_way",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// `completed` y `cancelled` no admiten más transiciones
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    /// Transiciones permitidas sin considerar quién las ejecuta
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Assigned)
                | (RequestStatus::Pending, RequestStatus::Cancelled)
                | (RequestStatus::Assigned, RequestStatus::OnTheWay)
                | (RequestStatus::OnTheWay, RequestStatus::Completed)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prioridad - mapea al ENUM request_priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, Default)]
#[sqlx(type_name = "request_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

/// Respuesta del hospital a una solicitud reenviada - mapea al ENUM hospital_response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "hospital_response", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HospitalResponse {
    Pending,
    Accepted,
    Rejected,
}

/// AmbulanceRequest principal - mapea exactamente a la tabla ambulance_requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AmbulanceRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub pickup_address: String,
    pub destination_address: Option<String>,
    pub emergency_type: String,
    pub condition_description: Option<String>,
    pub priority: Priority,
    pub status: RequestStatus,
    pub assigned_staff_id: Option<Uuid>,
    pub forwarded_hospital_id: Option<Uuid>,
    pub forwarded_by: Option<Uuid>,
    pub hospital_response: Option<HospitalResponse>,
    pub hospital_notes: Option<String>,
    pub hospital_read: bool,
    pub assigned_ambulance_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AmbulanceRequest {
    /// Solicitud nueva en estado `pending`
    pub fn new(requester_id: Uuid, patient_name: String, patient_phone: String, pickup_address: String, emergency_type: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            requester_id,
            patient_name,
            patient_phone,
            pickup_address,
            destination_address: None,
            emergency_type,
            condition_description: None,
            priority: Priority::Normal,
            status: RequestStatus::Pending,
            assigned_staff_id: None,
            forwarded_hospital_id: None,
            forwarded_by: None,
            hospital_response: None,
            hospital_notes: None,
            hospital_read: false,
            assigned_ambulance_id: None,
            created_at: now,
            updated_at: now,
            assigned_at: None,
            completed_at: None,
        }
    }

    pub fn is_forwarded_to(&self, hospital_id: Uuid) -> bool {
        self.forwarded_hospital_id == Some(hospital_id)
    }
}

/// Filtros de listado: cada filtro presente restringe el resultado,
/// de modo que el conjunto final es la intersección de todos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestFilter {
    pub search: Option<String>,
    pub status: Option<RequestStatus>,
    pub priority: Option<Priority>,
}

impl RequestFilter {
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none() && self.status.is_none() && self.priority.is_none()
    }

    /// Término de búsqueda normalizado; `None` si está vacío
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, request: &AmbulanceRequest) -> bool {
        if let Some(status) = self.status {
            if request.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if request.priority != priority {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => [
                request.patient_name.as_str(),
                request.patient_phone.as_str(),
                request.pickup_address.as_str(),
                request.emergency_type.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }

    /// Aplicar el filtro conservando el orden original
    pub fn apply<'a, I>(&self, requests: I) -> Vec<AmbulanceRequest>
    where
        I: IntoIterator<Item = &'a AmbulanceRequest>,
    {
        requests
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(patient: &str, status: RequestStatus, priority: Priority) -> AmbulanceRequest {
        let mut r = AmbulanceRequest::new(
            Uuid::new_v4(),
            patient.to_string(),
            "+15550100".to_string(),
            "12 Harbour Road".to_string(),
            "cardiac".to_string(),
        );
        r.status = status;
        r.priority = priority;
        r
    }

    #[test]
    fn test_status_filter_keeps_only_pending() {
        let pending = request("Ana", RequestStatus::Pending, Priority::Normal);
        let completed = request("Luis", RequestStatus::Completed, Priority::Normal);
        let filter = RequestFilter {
            status: Some(RequestStatus::Pending),
            ..Default::default()
        };

        let result = filter.apply(&[pending.clone(), completed]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, pending.id);
    }

    #[test]
    fn test_filters_intersect() {
        let a = request("Ana Ruiz", RequestStatus::Pending, Priority::Critical);
        let b = request("Ana Gomez", RequestStatus::Pending, Priority::Low);
        let c = request("Ana Diaz", RequestStatus::Assigned, Priority::Critical);
        let d = request("Pedro", RequestStatus::Pending, Priority::Critical);

        let filter = RequestFilter {
            search: Some("  ANA ".to_string()),
            status: Some(RequestStatus::Pending),
            priority: Some(Priority::Critical),
        };

        let result = filter.apply(&[a.clone(), b, c, d]);
        assert_eq!(result, vec![a]);
    }

    #[test]
    fn test_search_covers_address_and_emergency_type() {
        let r = request("Ana", RequestStatus::Pending, Priority::Normal);
        let by_address = RequestFilter {
            search: Some("harbour".to_string()),
            ..Default::default()
        };
        let by_type = RequestFilter {
            search: Some("CARDIAC".to_string()),
            ..Default::default()
        };
        assert!(by_address.matches(&r));
        assert!(by_type.matches(&r));
    }

    #[test]
    fn test_empty_filter_keeps_order() {
        let items = vec![
            request("B", RequestStatus::Completed, Priority::Low),
            request("A", RequestStatus::Pending, Priority::High),
        ];
        let filter = RequestFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&items), items);
    }

    #[test]
    fn test_status_transition_table() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Assigned));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Cancelled));
        assert!(RequestStatus::Assigned.can_transition_to(RequestStatus::OnTheWay));
        assert!(RequestStatus::OnTheWay.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::OnTheWay));
        assert!(!RequestStatus::Assigned.can_transition_to(RequestStatus::Cancelled));
        assert!(!RequestStatus::Completed.can_transition_to(RequestStatus::Pending));
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::OnTheWay).unwrap(),
            "\"on_the_way\""
        );
    }
}
