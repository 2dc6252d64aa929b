//! Máquina de estados de las solicitudes de ambulancia
//!
//! Reglas puras (sin base de datos) que deciden si una transición es válida
//! para un actor concreto. El servidor las aplica dentro de la transacción
//! y el cliente las usa para decidir qué acciones ofrecer.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Actor, Ambulance, AmbulanceRequest, AmbulanceStatus, HospitalResponse, RequestStatus, UserRole,
};
use crate::utils::errors::AppError;

/// Motivos por los que se rechaza una transición
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Request is already {0}")]
    Terminal(RequestStatus),

    #[error("Cannot move request from {from} to {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },

    #[error("Request is already assigned to a staff member")]
    AlreadyAssigned,

    #[error("Only the assigned staff member can update this request")]
    NotAssignedStaff,

    #[error("An admin must name the staff member who takes the request")]
    StaffRequired,

    #[error("Role {0} cannot perform this action")]
    RoleNotAllowed(UserRole),

    #[error("Only the requester or dispatch staff can cancel this request")]
    NotRequester,

    #[error("Request was not forwarded to this hospital")]
    NotForwardedToHospital,

    #[error("Hospital has already responded to this request")]
    AlreadyResponded,

    #[error("Request has not been accepted by the hospital")]
    NotAccepted,

    #[error("An ambulance must be selected to accept the request")]
    AmbulanceRequired,

    #[error("Notes are required when rejecting a request")]
    NotesRequired,

    #[error("Response must be accepted or rejected")]
    InvalidResponse,

    #[error("Ambulance does not belong to this hospital")]
    ForeignAmbulance,

    #[error("Ambulance is {0}, only available ambulances can be assigned")]
    AmbulanceUnavailable(&'static str),

    #[error("Request already has an ambulance assigned")]
    AmbulanceAlreadyBound,

    #[error("Ambulance is not assigned, nothing to park")]
    NotParkable,

    #[error("Target user is not a hospital")]
    NotAHospital,

    #[error("Request has already been accepted by a hospital")]
    AlreadyAccepted,
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        let message = e.to_string();
        match e {
            WorkflowError::NotAssignedStaff
            | WorkflowError::RoleNotAllowed(_)
            | WorkflowError::NotRequester
            | WorkflowError::NotForwardedToHospital
            | WorkflowError::ForeignAmbulance => AppError::Forbidden(message),
            WorkflowError::AmbulanceRequired
            | WorkflowError::NotesRequired
            | WorkflowError::InvalidResponse
            | WorkflowError::NotAHospital
            | WorkflowError::StaffRequired => AppError::BadRequest(message),
            WorkflowError::Terminal(_)
            | WorkflowError::InvalidTransition { .. }
            | WorkflowError::AlreadyAssigned
            | WorkflowError::AlreadyResponded
            | WorkflowError::NotAccepted
            | WorkflowError::AmbulanceUnavailable(_)
            | WorkflowError::AmbulanceAlreadyBound
            | WorkflowError::NotParkable
            | WorkflowError::AlreadyAccepted => AppError::Conflict(message),
        }
    }
}

pub type WorkflowResult<T = ()> = Result<T, WorkflowError>;

/// Acciones que la interfaz puede ofrecer sobre una solicitud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    AssignToMe,
    MarkOnTheWay,
    MarkCompleted,
    Cancel,
    Forward,
    AcceptForwarded,
    RejectForwarded,
    MarkRead,
}

fn ensure_not_terminal(request: &AmbulanceRequest) -> WorkflowResult {
    if request.status.is_terminal() {
        return Err(WorkflowError::Terminal(request.status));
    }
    Ok(())
}

/// `pending → assigned`: un miembro del staff reclama la solicitud.
/// `staff_id` es quien queda asignado; solo un admin puede nombrar a otro
/// y nunca a sí mismo.
pub fn check_claim(request: &AmbulanceRequest, actor: &Actor, staff_id: Uuid) -> WorkflowResult {
    match actor.role {
        UserRole::Staff if staff_id == actor.user_id => {}
        UserRole::Admin if staff_id != actor.user_id => {}
        UserRole::Admin => return Err(WorkflowError::StaffRequired),
        role => return Err(WorkflowError::RoleNotAllowed(role)),
    }
    ensure_not_terminal(request)?;
    if request.assigned_staff_id.is_some() {
        return Err(WorkflowError::AlreadyAssigned);
    }
    if request.status != RequestStatus::Pending {
        return Err(WorkflowError::InvalidTransition {
            from: request.status,
            to: RequestStatus::Assigned,
        });
    }
    Ok(())
}

/// Cambio de estado explícito (`on_the_way`, `completed`, `cancelled`)
pub fn check_status_change(
    request: &AmbulanceRequest,
    actor: &Actor,
    target: RequestStatus,
) -> WorkflowResult {
    ensure_not_terminal(request)?;

    // `assigned` solo se alcanza reclamando la solicitud
    if target == RequestStatus::Assigned || !request.status.can_transition_to(target) {
        return Err(WorkflowError::InvalidTransition {
            from: request.status,
            to: target,
        });
    }

    match target {
        RequestStatus::Cancelled => {
            if actor.user_id == request.requester_id || actor.role.is_dispatcher() {
                Ok(())
            } else {
                Err(WorkflowError::NotRequester)
            }
        }
        _ => {
            if request.assigned_staff_id == Some(actor.user_id) {
                Ok(())
            } else {
                Err(WorkflowError::NotAssignedStaff)
            }
        }
    }
}

/// Reenvío de la solicitud a un hospital
pub fn check_forward(request: &AmbulanceRequest, actor: &Actor, target_role: UserRole) -> WorkflowResult {
    if !actor.role.is_dispatcher() {
        return Err(WorkflowError::RoleNotAllowed(actor.role));
    }
    if target_role != UserRole::Hospital {
        return Err(WorkflowError::NotAHospital);
    }
    ensure_not_terminal(request)?;
    if request.hospital_response == Some(HospitalResponse::Accepted) {
        return Err(WorkflowError::AlreadyAccepted);
    }
    Ok(())
}

/// Respuesta del hospital. Para aceptar hace falta una ambulancia propia disponible;
/// para rechazar, notas no vacías.
pub fn check_hospital_response(
    request: &AmbulanceRequest,
    actor: &Actor,
    response: HospitalResponse,
    ambulance: Option<&Ambulance>,
    notes: Option<&str>,
) -> WorkflowResult {
    if actor.role != UserRole::Hospital {
        return Err(WorkflowError::RoleNotAllowed(actor.role));
    }
    if !request.is_forwarded_to(actor.user_id) {
        return Err(WorkflowError::NotForwardedToHospital);
    }
    ensure_not_terminal(request)?;
    if request.hospital_response != Some(HospitalResponse::Pending) {
        return Err(WorkflowError::AlreadyResponded);
    }

    check_response_payload(response, ambulance.map(|a| a.id), notes)?;
    match (response, ambulance) {
        (HospitalResponse::Accepted, Some(ambulance)) => check_ambulance_bindable(ambulance, actor),
        _ => Ok(()),
    }
}

/// Validación del formulario de respuesta antes de tocar el estado: aceptar
/// exige ambulancia seleccionada y rechazar exige notas.
pub fn check_response_payload(
    response: HospitalResponse,
    ambulance_id: Option<Uuid>,
    notes: Option<&str>,
) -> WorkflowResult {
    match response {
        HospitalResponse::Accepted if ambulance_id.is_none() => Err(WorkflowError::AmbulanceRequired),
        HospitalResponse::Accepted => Ok(()),
        HospitalResponse::Rejected => match notes.map(str::trim) {
            Some(n) if !n.is_empty() => Ok(()),
            _ => Err(WorkflowError::NotesRequired),
        },
        HospitalResponse::Pending => Err(WorkflowError::InvalidResponse),
    }
}

/// Asignación directa de una ambulancia a una solicitud ya aceptada
pub fn check_fleet_assignment(
    request: &AmbulanceRequest,
    actor: &Actor,
    ambulance: &Ambulance,
) -> WorkflowResult {
    if actor.role != UserRole::Hospital {
        return Err(WorkflowError::RoleNotAllowed(actor.role));
    }
    if !request.is_forwarded_to(actor.user_id) {
        return Err(WorkflowError::NotForwardedToHospital);
    }
    ensure_not_terminal(request)?;
    if request.hospital_response != Some(HospitalResponse::Accepted) {
        return Err(WorkflowError::NotAccepted);
    }
    if request.assigned_ambulance_id.is_some() {
        return Err(WorkflowError::AmbulanceAlreadyBound);
    }
    check_ambulance_bindable(ambulance, actor)
}

fn check_ambulance_bindable(ambulance: &Ambulance, actor: &Actor) -> WorkflowResult {
    if ambulance.hospital_id != actor.user_id {
        return Err(WorkflowError::ForeignAmbulance);
    }
    if !ambulance.is_available() {
        return Err(WorkflowError::AmbulanceUnavailable(ambulance.status.as_str()));
    }
    Ok(())
}

/// Aparcar: la ambulancia vuelve al pool de disponibles
pub fn check_park(ambulance: &Ambulance, actor: &Actor) -> WorkflowResult {
    if ambulance.hospital_id != actor.user_id {
        return Err(WorkflowError::ForeignAmbulance);
    }
    if ambulance.status != AmbulanceStatus::Assigned {
        return Err(WorkflowError::NotParkable);
    }
    Ok(())
}

/// Acciones disponibles para `actor` sobre `request`, en orden de presentación
pub fn available_actions(request: &AmbulanceRequest, actor: &Actor) -> Vec<RequestAction> {
    let mut actions = Vec::new();
    if request.status.is_terminal() {
        return actions;
    }

    if check_claim(request, actor, actor.user_id).is_ok() {
        actions.push(RequestAction::AssignToMe);
    }
    if check_status_change(request, actor, RequestStatus::OnTheWay).is_ok() {
        actions.push(RequestAction::MarkOnTheWay);
    }
    if check_status_change(request, actor, RequestStatus::Completed).is_ok() {
        actions.push(RequestAction::MarkCompleted);
    }
    if check_status_change(request, actor, RequestStatus::Cancelled).is_ok() {
        actions.push(RequestAction::Cancel);
    }
    if check_forward(request, actor, UserRole::Hospital).is_ok() {
        actions.push(RequestAction::Forward);
    }

    if actor.role == UserRole::Hospital
        && request.is_forwarded_to(actor.user_id)
        && request.hospital_response == Some(HospitalResponse::Pending)
    {
        actions.push(RequestAction::AcceptForwarded);
        actions.push(RequestAction::RejectForwarded);
        if !request.hospital_read {
            actions.push(RequestAction::MarkRead);
        }
    }

    actions
}
