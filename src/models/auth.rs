use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Roles del sistema - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Doctor,
    Staff,
    Customer,
    Hospital,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Doctor => "doctor",
            UserRole::Staff => "staff",
            UserRole::Customer => "customer",
            UserRole::Hospital => "hospital",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "doctor" => Some(UserRole::Doctor),
            "staff" => Some(UserRole::Staff),
            "customer" => Some(UserRole::Customer),
            "hospital" => Some(UserRole::Hospital),
            _ => None,
        }
    }

    /// Roles de despacho: pueden reclamar, reenviar y cancelar solicitudes
    pub fn is_dispatcher(&self) -> bool {
        matches!(self, UserRole::Staff | UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usuario autenticado que actúa sobre el sistema.
/// Se inyecta en las requests desde el JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
    pub name: String,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            name: name.into(),
        }
    }

    pub fn has_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }
}
