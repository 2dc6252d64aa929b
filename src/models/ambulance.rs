//! Modelo de Ambulance
//! 
//! Flota de un hospital. Mapea a la tabla ambulances con los ENUM
//! ambulance_type y ambulance_status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de ambulancia - mapea al ENUM ambulance_type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "ambulance_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AmbulanceType {
    Basic,
    Advanced,
    Icu,
    PatientTransport,
}

/// Estado de la ambulancia - mapea al ENUM ambulance_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "ambulance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AmbulanceStatus {
    Available,
    Assigned,
    Parked,
    Maintenance,
}

impl AmbulanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbulanceStatus::Available => "available",
            AmbulanceStatus::Assigned => "assigned",
            AmbulanceStatus::Parked => "parked",
            AmbulanceStatus::Maintenance => "maintenance",
        }
    }
}

/// Ambulance principal - mapea exactamente a la tabla ambulances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Ambulance {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub registration_number: String,
    pub ambulance_type: AmbulanceType,
    pub driver_name: String,
    pub driver_phone: Option<String>,
    pub status: AmbulanceStatus,
    pub current_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ambulance {
    pub fn new(
        hospital_id: Uuid,
        registration_number: String,
        ambulance_type: AmbulanceType,
        driver_name: String,
        driver_phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            hospital_id,
            registration_number,
            ambulance_type,
            driver_name,
            driver_phone,
            status: AmbulanceStatus::Available,
            current_request_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == AmbulanceStatus::Available
    }
}
