//! Reglas de autorización por rol y por propiedad de la solicitud

use crate::models::{Actor, AmbulanceRequest, UserRole};
use crate::utils::errors::{forbidden_error, AppResult};

/// Verifica que el actor tenga alguno de los roles requeridos
pub fn require_role(actor: &Actor, roles: &[UserRole], operation: &str) -> AppResult<()> {
    if actor.has_role(roles) {
        Ok(())
    } else {
        Err(forbidden_error(
            operation,
            &format!("role '{}' is not allowed", actor.role),
        ))
    }
}

/// Quién puede ver una solicitud: su autor, el staff clínico y de despacho,
/// y el hospital al que se reenvió
pub fn can_view_request(actor: &Actor, request: &AmbulanceRequest) -> bool {
    match actor.role {
        UserRole::Admin | UserRole::Staff | UserRole::Doctor => true,
        UserRole::Customer => request.requester_id == actor.user_id,
        UserRole::Hospital => request.is_forwarded_to(actor.user_id),
    }
}

/// Quién puede editar los datos de una solicitud pendiente
pub fn can_edit_request(actor: &Actor, request: &AmbulanceRequest) -> bool {
    actor.role.is_dispatcher() || request.requester_id == actor.user_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request_by(requester: Uuid) -> AmbulanceRequest {
        AmbulanceRequest::new(
            requester,
            "Paciente".to_string(),
            "5550100".to_string(),
            "Avenida 1".to_string(),
            "stroke".to_string(),
        )
    }

    #[test]
    fn test_customer_sees_only_own_requests() {
        let customer = Actor::new(Uuid::new_v4(), UserRole::Customer, "c");
        assert!(can_view_request(&customer, &request_by(customer.user_id)));
        assert!(!can_view_request(&customer, &request_by(Uuid::new_v4())));
    }

    #[test]
    fn test_hospital_sees_only_forwarded_requests() {
        let hospital = Actor::new(Uuid::new_v4(), UserRole::Hospital, "h");
        let mut request = request_by(Uuid::new_v4());
        assert!(!can_view_request(&hospital, &request));
        request.forwarded_hospital_id = Some(hospital.user_id);
        assert!(can_view_request(&hospital, &request));
    }

    #[test]
    fn test_require_role() {
        let doctor = Actor::new(Uuid::new_v4(), UserRole::Doctor, "d");
        assert!(require_role(&doctor, &[UserRole::Doctor, UserRole::Admin], "view").is_ok());
        assert!(require_role(&doctor, &[UserRole::Hospital], "park ambulance").is_err());
    }

    #[test]
    fn test_doctor_cannot_edit_others_requests() {
        let doctor = Actor::new(Uuid::new_v4(), UserRole::Doctor, "d");
        assert!(!can_edit_request(&doctor, &request_by(Uuid::new_v4())));
        let staff = Actor::new(Uuid::new_v4(), UserRole::Staff, "s");
        assert!(can_edit_request(&staff, &request_by(Uuid::new_v4())));
    }
}
