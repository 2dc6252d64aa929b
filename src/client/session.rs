//! Sesión persistida del cliente
//! 
//! Guarda `{token, user_id, role, name}` en un fichero JSON. Se escribe al
//! hacer login y se borra al hacer logout.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
};
use uuid::Uuid;

use super::ClientResult;
use crate::dto::auth_dto::LoginResponse;
use crate::models::{Actor, UserRole};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub role: UserRole,
    pub name: String,
}

impl Session {
    /// Actor equivalente al que el servidor extrae del token
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role, self.name.clone())
    }
}

impl From<LoginResponse> for Session {
    fn from(login: LoginResponse) -> Self {
        Self {
            token: login.token,
            user_id: login.user_id,
            role: login.role,
            name: login.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `None` si no hay sesión guardada
    pub fn load(&self) -> ClientResult<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    pub fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session() -> Session {
        Session {
            token: "header.payload.signature".to_string(),
            user_id: Uuid::new_v4(),
            role: UserRole::Staff,
            name: "Dana".to_string(),
        }
    }

    #[test]
    fn test_load_without_file_is_none() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));
        let saved = session();

        store.save(&saved).unwrap();
        assert_eq!(store.load().unwrap(), Some(saved));
    }

    #[test]
    fn test_clear_removes_session() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&session()).unwrap();

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Borrar dos veces no es un error
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let err = SessionStore::new(path).load().unwrap_err();
        assert!(matches!(err, crate::client::ClientError::Serialization(_)));
    }

    #[test]
    fn test_actor_from_session() {
        let s = session();
        let actor = s.actor();
        assert_eq!(actor.user_id, s.user_id);
        assert_eq!(actor.role, UserRole::Staff);
    }
}
