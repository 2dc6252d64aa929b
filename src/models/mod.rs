//! Modelos del sistema
//! 
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL con las convenciones estándar.

pub mod ambulance;
pub mod ambulance_request;
pub mod auth;
pub mod notification;
pub mod user;

pub use ambulance::{Ambulance, AmbulanceStatus, AmbulanceType};
pub use ambulance_request::{AmbulanceRequest, HospitalResponse, Priority, RequestFilter, RequestStatus};
pub use auth::{Actor, UserRole};
pub use notification::{NewNotification, Notification, NotificationList};
pub use user::{User, UserResponse};
