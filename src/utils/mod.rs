//! Utilidades del sistema
//! 
//! Este módulo contiene utilidades para manejo de errores, validación
//! y JWT.

pub mod errors;
pub mod jwt;
pub mod validation;
pub mod extractors;
