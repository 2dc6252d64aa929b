use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{AmbulanceStatus, AmbulanceType};
use crate::utils::validation::{validate_not_blank, PHONE_REGEX};

/// Request para dar de alta una ambulancia en la flota
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAmbulanceUnitRequest {
    #[validate(length(min = 3, max = 32), custom = "validate_not_blank")]
    pub registration_number: String,

    pub ambulance_type: AmbulanceType,

    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub driver_name: String,

    #[validate(regex = "PHONE_REGEX")]
    pub driver_phone: Option<String>,
}

/// Request para editar una ambulancia. `status` solo acepta
/// `available`, `parked` o `maintenance`; `assigned` se alcanza asignando.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAmbulanceUnitRequest {
    #[validate(length(min = 3, max = 32), custom = "validate_not_blank")]
    pub registration_number: Option<String>,

    pub ambulance_type: Option<AmbulanceType>,

    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub driver_name: Option<String>,

    #[validate(regex = "PHONE_REGEX")]
    pub driver_phone: Option<String>,

    pub status: Option<AmbulanceStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetListQuery {
    pub status: Option<AmbulanceStatus>,
}
