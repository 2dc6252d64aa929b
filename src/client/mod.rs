//! Cliente HTTP de la API
//! 
//! Llamadas tipadas para cada endpoint, autenticadas con el token de la
//! sesión persistida. Los errores del servidor llegan como
//! `ClientError::Api` con el mensaje del campo `error`; los fallos de
//! transporte como `ClientError::Network`. No hay reintentos.

pub mod notification_panel;
pub mod poller;
pub mod request_filter;
pub mod session;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dto::ambulance_dto::{
    AmbulanceListQuery, AmbulanceRequestResponse, AssignRequest, CreateAmbulanceRequest,
    ForwardRequest, HospitalResponseRequest, UpdateAmbulanceRequest, UpdateStatusRequest,
};
use crate::dto::auth_dto::{
    ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest,
};
use crate::dto::fleet_dto::{CreateAmbulanceUnitRequest, FleetListQuery, UpdateAmbulanceUnitRequest};
use crate::dto::ApiResponse;
use crate::models::{
    Ambulance, AmbulanceRequest, AmbulanceStatus, HospitalResponse, NotificationList,
    RequestFilter, RequestStatus, UserResponse,
};
use crate::services::ambulance_workflow::{check_response_payload, WorkflowError};

pub use notification_panel::{NotificationPanel, PanelEvent};
pub use poller::{spawn_notification_poller, NotificationSource, PollerHandle, DEFAULT_POLL_INTERVAL};
pub use session::{Session, SessionStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error")]
    Network(#[source] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response body: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<WorkflowError> for ClientError {
    fn from(error: WorkflowError) -> Self {
        ClientError::Validation(error.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Convertir una respuesta no-2xx en `ClientError::Api`
fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected error")
                .to_string()
        });

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

fn into_data<T>(response: ApiResponse<T>) -> ClientResult<T> {
    response
        .data
        .ok_or_else(|| ClientError::Validation("Response without data".to_string()))
}

/// Formulario de respuesta del hospital a una solicitud reenviada
#[derive(Debug, Clone, PartialEq)]
pub struct HospitalResponseForm {
    pub response: HospitalResponse,
    pub ambulance_id: Option<Uuid>,
    pub notes: String,
}

impl HospitalResponseForm {
    pub fn accept(ambulance_id: Option<Uuid>) -> Self {
        Self {
            response: HospitalResponse::Accepted,
            ambulance_id,
            notes: String::new(),
        }
    }

    pub fn reject(notes: impl Into<String>) -> Self {
        Self {
            response: HospitalResponse::Rejected,
            ambulance_id: None,
            notes: notes.into(),
        }
    }

    /// Aceptar exige ambulancia seleccionada; rechazar exige notas
    pub fn validate(&self) -> ClientResult<HospitalResponseRequest> {
        let notes = Some(self.notes.trim()).filter(|n| !n.is_empty());
        check_response_payload(self.response, self.ambulance_id, notes)?;

        Ok(HospitalResponseRequest {
            response: self.response,
            ambulance_id: self.ambulance_id,
            notes: notes.map(str::to_string),
        })
    }
}

#[derive(Serialize)]
struct NoBody {}

pub struct ApiClient {
    http: Client,
    base_url: String,
    store: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: SessionStore) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn session(&self) -> ClientResult<Option<Session>> {
        self.store.load()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> ClientResult<RequestBuilder> {
        let session = self.store.load()?.ok_or(ClientError::NotAuthenticated)?;
        Ok(builder.bearer_auth(session.token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await.map_err(|e| {
            warn!("⚠️ Fallo de red: {}", e);
            ClientError::Network(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(ClientError::Network)?;
        debug!("📡 {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let builder = self.authorized(self.http.get(self.url(path)))?;
        self.send(builder).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let builder = self.authorized(self.http.post(self.url(path)).json(body))?;
        self.send(builder).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let builder = self.authorized(self.http.put(self.url(path)).json(body))?;
        self.send(builder).await
    }

    // --- Autenticación ---

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<UserResponse> {
        let builder = self.http.post(self.url("/api/auth/register")).json(request);
        into_data(self.send::<ApiResponse<UserResponse>>(builder).await?)
    }

    /// Login; la sesión queda guardada en el store
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let builder = self.http.post(self.url("/api/auth/login")).json(&request);
        let session = Session::from(self.send::<LoginResponse>(builder).await?);

        self.store.save(&session)?;
        Ok(session)
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.store.clear()
    }

    pub async fn me(&self) -> ClientResult<UserResponse> {
        self.get("/api/auth/me").await
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<ForgotPasswordResponse> {
        let request = ForgotPasswordRequest {
            email: email.to_string(),
        };
        let builder = self.http.post(self.url("/api/auth/forgot-password")).json(&request);
        self.send(builder).await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> ClientResult<()> {
        let request = ResetPasswordRequest {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        let builder = self.http.post(self.url("/api/auth/reset-password")).json(&request);
        self.send::<ApiResponse<()>>(builder).await?;
        Ok(())
    }

    // --- Solicitudes de ambulancia ---

    pub async fn list_requests(&self, filter: &RequestFilter) -> ClientResult<Vec<AmbulanceRequestResponse>> {
        let query = AmbulanceListQuery::from(filter);
        let builder = self.authorized(self.http.get(self.url("/api/ambulance")).query(&query))?;
        self.send(builder).await
    }

    pub async fn create_request(&self, request: &CreateAmbulanceRequest) -> ClientResult<AmbulanceRequestResponse> {
        into_data(self.post("/api/ambulance", request).await?)
    }

    pub async fn get_request(&self, id: Uuid) -> ClientResult<AmbulanceRequestResponse> {
        self.get(&format!("/api/ambulance/{}", id)).await
    }

    pub async fn update_request(
        &self,
        id: Uuid,
        changes: &UpdateAmbulanceRequest,
    ) -> ClientResult<AmbulanceRequestResponse> {
        into_data(self.put(&format!("/api/ambulance/{}", id), changes).await?)
    }

    /// "Asignarme"
    pub async fn assign_to_me(&self, id: Uuid) -> ClientResult<AmbulanceRequestResponse> {
        into_data(
            self.post(&format!("/api/ambulance/{}/assign", id), &AssignRequest::default())
                .await?,
        )
    }

    pub async fn update_status(&self, id: Uuid, status: RequestStatus) -> ClientResult<AmbulanceRequestResponse> {
        let body = UpdateStatusRequest { status };
        into_data(self.put(&format!("/api/ambulance/{}/status", id), &body).await?)
    }

    pub async fn forward(&self, id: Uuid, hospital_id: Uuid) -> ClientResult<AmbulanceRequestResponse> {
        let body = ForwardRequest { hospital_id };
        into_data(self.post(&format!("/api/ambulance/{}/forward", id), &body).await?)
    }

    pub async fn forwarded_requests(&self) -> ClientResult<Vec<AmbulanceRequestResponse>> {
        self.get("/api/ambulance/hospital/forwarded-requests").await
    }

    /// Valida el formulario antes de cualquier llamada de red
    pub async fn respond_to_forwarded(
        &self,
        id: Uuid,
        form: &HospitalResponseForm,
    ) -> ClientResult<AmbulanceRequestResponse> {
        let body = form.validate()?;
        into_data(
            self.post(&format!("/api/ambulance/{}/hospital-response", id), &body)
                .await?,
        )
    }

    pub async fn mark_request_read(&self, id: Uuid) -> ClientResult<AmbulanceRequestResponse> {
        self.post(&format!("/api/ambulance/{}/mark-read", id), &NoBody {})
            .await
    }

    // --- Flota del hospital ---

    pub async fn list_ambulances(&self, status: Option<AmbulanceStatus>) -> ClientResult<Vec<Ambulance>> {
        let query = FleetListQuery { status };
        let builder = self.authorized(
            self.http
                .get(self.url("/api/hospital/ambulances"))
                .query(&query),
        )?;
        self.send(builder).await
    }

    pub async fn create_ambulance(&self, request: &CreateAmbulanceUnitRequest) -> ClientResult<Ambulance> {
        into_data(self.post("/api/hospital/ambulances", request).await?)
    }

    pub async fn get_ambulance(&self, id: Uuid) -> ClientResult<Ambulance> {
        self.get(&format!("/api/hospital/ambulances/{}", id)).await
    }

    pub async fn update_ambulance(
        &self,
        id: Uuid,
        changes: &UpdateAmbulanceUnitRequest,
    ) -> ClientResult<Ambulance> {
        into_data(
            self.put(&format!("/api/hospital/ambulances/{}", id), changes)
                .await?,
        )
    }

    pub async fn delete_ambulance(&self, id: Uuid) -> ClientResult<()> {
        let builder = self.authorized(
            self.http
                .delete(self.url(&format!("/api/hospital/ambulances/{}", id))),
        )?;
        self.send::<serde_json::Value>(builder).await?;
        Ok(())
    }

    pub async fn park_ambulance(&self, id: Uuid) -> ClientResult<Ambulance> {
        into_data(
            self.post(&format!("/api/hospital/ambulances/{}/park", id), &NoBody {})
                .await?,
        )
    }

    pub async fn assign_ambulance(&self, id: Uuid, request_id: Uuid) -> ClientResult<(Ambulance, AmbulanceRequest)> {
        #[derive(Deserialize)]
        struct Assignment {
            ambulance: Ambulance,
            request: AmbulanceRequest,
        }

        let response: ApiResponse<Assignment> = self
            .post(
                &format!("/api/hospital/ambulances/{}/assign/{}", id, request_id),
                &NoBody {},
            )
            .await?;
        let assignment = into_data(response)?;
        Ok((assignment.ambulance, assignment.request))
    }

    // --- Notificaciones ---

    pub async fn list_notifications(&self) -> ClientResult<NotificationList> {
        self.get("/api/notifications").await
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> ClientResult<()> {
        self.post::<_, serde_json::Value>(&format!("/api/notifications/{}/read", id), &NoBody {})
            .await?;
        Ok(())
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        self.post::<_, serde_json::Value>("/api/notifications/mark-all-read", &NoBody {})
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Puerto cerrado: cualquier intento de conexión falla
    const UNREACHABLE: &str = "http://127.0.0.1:1";

    #[test]
    fn test_accept_requires_ambulance() {
        let err = HospitalResponseForm::accept(None).validate().unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_reject_requires_notes() {
        let err = HospitalResponseForm::reject("   ").validate().unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_valid_forms() {
        let ambulance_id = Uuid::new_v4();
        let accepted = HospitalResponseForm::accept(Some(ambulance_id)).validate().unwrap();
        assert_eq!(accepted.ambulance_id, Some(ambulance_id));
        assert_eq!(accepted.notes, None);

        let rejected = HospitalResponseForm::reject(" No beds ").validate().unwrap();
        assert_eq!(rejected.notes.as_deref(), Some("No beds"));
    }

    #[test]
    fn test_api_error_uses_error_field() {
        let err = api_error(StatusCode::CONFLICT, br#"{"error":"Request is already assigned","code":"CONFLICT"}"#);
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Request is already assigned");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_without_json_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_respond_validates_before_network() {
        let dir = tempdir().unwrap();
        let client = ApiClient::new(UNREACHABLE, SessionStore::new(dir.path().join("s.json"))).unwrap();

        let err = client
            .respond_to_forwarded(Uuid::new_v4(), &HospitalResponseForm::accept(None))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_protected_call_without_session() {
        let dir = tempdir().unwrap();
        let client = ApiClient::new(UNREACHABLE, SessionStore::new(dir.path().join("s.json"))).unwrap();

        let err = client.list_notifications().await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let dir = tempdir().unwrap();
        let client = ApiClient::new(UNREACHABLE, SessionStore::new(dir.path().join("s.json"))).unwrap();

        let err = client.login("dana@example.com", "secret-pass").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(err.to_string(), "Network error");
    }
}
