//! DTOs de la API
//! 
//! Cuerpos de request y response compartidos por el servidor y el cliente.

pub mod ambulance_dto;
pub mod api_response;
pub mod auth_dto;
pub mod fleet_dto;

pub use api_response::ApiResponse;
