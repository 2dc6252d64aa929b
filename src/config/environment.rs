//! Configuración de variables de entorno
//! 
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::models::UserRole;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub jwt_secret: String,
    /// Vida del JWT en segundos
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub reset_token_ttl_minutes: i64,
    /// Roles que `/api/auth/register` acepta sin intervención de un admin
    pub self_registration_roles: Vec<UserRole>,
}

impl EnvironmentConfig {
    /// Leer la configuración desde las variables de entorno del proceso
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construir la configuración a partir de una función de búsqueda de claves.
    /// `DATABASE_URL` y `JWT_SECRET` son obligatorias; el resto tiene valor por defecto.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{} must be set", key));

        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration: parse_or(&lookup, "JWT_EXPIRATION", 86_400)?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            reset_token_ttl_minutes: parse_or(&lookup, "RESET_TOKEN_TTL_MINUTES", 60)?,
            self_registration_roles: parse_roles(lookup("SELF_REGISTRATION_ROLES"))?,
        })
    }

    pub fn allows_self_registration(&self, role: UserRole) -> bool {
        self.self_registration_roles.contains(&role)
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección de escucha del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Nivel de log para tracing-subscriber
    pub fn tracing_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log_level).unwrap_or(tracing::Level::INFO)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

/// Lista separada por comas; sin valor solo se admite `customer`
fn parse_roles(raw: Option<String>) -> Result<Vec<UserRole>> {
    let Some(raw) = raw else {
        return Ok(vec![UserRole::Customer]);
    };

    let mut roles = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let role = UserRole::parse(&name.to_lowercase())
            .ok_or_else(|| anyhow!("SELF_REGISTRATION_ROLES: unknown role '{}'", name))?;
        if role == UserRole::Admin {
            bail!("SELF_REGISTRATION_ROLES cannot include admin");
        }
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    Ok(roles)
}
