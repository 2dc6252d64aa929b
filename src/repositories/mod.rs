//! Repositorios
//! 
//! Acceso a PostgreSQL por tabla. Las operaciones que forman parte de una
//! transacción reciben la conexión explícitamente.

pub mod ambulance_repository;
pub mod ambulance_request_repository;
pub mod notification_repository;
pub mod user_repository;
