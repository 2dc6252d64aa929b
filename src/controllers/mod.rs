//! Controladores
//! 
//! Orquestan validación, reglas de negocio, repositorios y notificaciones
//! para cada recurso de la API.

pub mod ambulance_request_controller;
pub mod auth_controller;
pub mod fleet_controller;
pub mod notification_controller;
