//! Filtrado local de solicitudes
//! 
//! Mismas reglas que el listado del servidor: búsqueda sin distinguir
//! mayúsculas sobre paciente, teléfono, dirección de recogida y tipo de
//! emergencia, más estado y prioridad. Se conserva el orden recibido.

use super::session::Session;
use crate::dto::ambulance_dto::AmbulanceRequestResponse;
use crate::models::AmbulanceRequest;
use crate::services::ambulance_workflow::{available_actions, RequestAction};

pub use crate::models::RequestFilter;

pub fn filter_requests<'a>(
    requests: &'a [AmbulanceRequestResponse],
    filter: &RequestFilter,
) -> Vec<&'a AmbulanceRequestResponse> {
    requests
        .iter()
        .filter(|item| filter.matches(&item.request))
        .collect()
}

/// Acciones que la sesión actual puede ofrecer sobre una solicitud
pub fn actions_for(request: &AmbulanceRequest, session: &Session) -> Vec<RequestAction> {
    available_actions(request, &session.actor())
}
