//! Services module
//! 
//! Este módulo contiene la lógica de negocio de la aplicación: la máquina de
//! estados de las solicitudes, las reglas de autorización y el envío de
//! notificaciones.

pub mod ambulance_workflow;
pub mod authorization_service;
pub mod notification_service;

pub use ambulance_workflow::{available_actions, RequestAction, WorkflowError};
