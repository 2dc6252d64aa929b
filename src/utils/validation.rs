//! Utilidades de validación
//! 
//! Validadores personalizados para los DTO con `validator` y generación
//! de tokens de reseteo.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Teléfono con prefijo internacional opcional, 7 a 15 dígitos
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("valid phone regex");
}

/// Validar que un string no esté vacío ni sea solo espacios
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Normalizar texto libre opcional: recortar y descartar si queda vacío
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Token aleatorio de 32 bytes codificado en base64 URL-safe
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
