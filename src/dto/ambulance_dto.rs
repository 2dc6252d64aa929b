use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{AmbulanceRequest, HospitalResponse, Priority, RequestFilter, RequestStatus};
use crate::services::ambulance_workflow::RequestAction;
use crate::utils::validation::{validate_not_blank, PHONE_REGEX};

/// Request para crear una solicitud de ambulancia
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAmbulanceRequest {
    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub patient_name: String,

    #[validate(regex = "PHONE_REGEX")]
    pub patient_phone: String,

    #[validate(length(min = 5, max = 500), custom = "validate_not_blank")]
    pub pickup_address: String,

    #[validate(length(max = 500))]
    pub destination_address: Option<String>,

    #[validate(length(min = 2, max = 64), custom = "validate_not_blank")]
    pub emergency_type: String,

    #[validate(length(max = 2000))]
    pub condition_description: Option<String>,

    pub priority: Option<Priority>,
}

/// Request para editar una solicitud pendiente
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAmbulanceRequest {
    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub patient_name: Option<String>,

    #[validate(regex = "PHONE_REGEX")]
    pub patient_phone: Option<String>,

    #[validate(length(min = 5, max = 500), custom = "validate_not_blank")]
    pub pickup_address: Option<String>,

    #[validate(length(max = 500))]
    pub destination_address: Option<String>,

    #[validate(length(min = 2, max = 64), custom = "validate_not_blank")]
    pub emergency_type: Option<String>,

    #[validate(length(max = 2000))]
    pub condition_description: Option<String>,

    pub priority: Option<Priority>,
}

/// "Asignarme": un admin puede indicar otro miembro del staff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignRequest {
    pub staff_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardRequest {
    pub hospital_id: Uuid,
}

/// Respuesta del hospital a una solicitud reenviada
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HospitalResponseRequest {
    pub response: HospitalResponse,

    pub ambulance_id: Option<Uuid>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Query string del listado: `?search=&status=&priority=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmbulanceListQuery {
    pub search: Option<String>,
    pub status: Option<RequestStatus>,
    pub priority: Option<Priority>,
}

impl From<AmbulanceListQuery> for RequestFilter {
    fn from(query: AmbulanceListQuery) -> Self {
        Self {
            search: query.search,
            status: query.status,
            priority: query.priority,
        }
    }
}

impl From<&RequestFilter> for AmbulanceListQuery {
    fn from(filter: &RequestFilter) -> Self {
        Self {
            search: filter.search_term(),
            status: filter.status,
            priority: filter.priority,
        }
    }
}

/// Solicitud con las acciones que el usuario puede ejecutar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbulanceRequestResponse {
    #[serde(flatten)]
    pub request: AmbulanceRequest,
    pub actions: Vec<RequestAction>,
}
