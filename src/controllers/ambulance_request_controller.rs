use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::ambulance_dto::{
    AmbulanceListQuery, AmbulanceRequestResponse, AssignRequest, CreateAmbulanceRequest,
    ForwardRequest, HospitalResponseRequest, UpdateAmbulanceRequest,
};
use crate::models::{Actor, AmbulanceRequest, HospitalResponse, RequestFilter, RequestStatus, UserRole};
use crate::repositories::ambulance_repository::AmbulanceRepository;
use crate::repositories::ambulance_request_repository::AmbulanceRequestRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::ambulance_workflow::{self, available_actions};
use crate::services::authorization_service::{can_edit_request, can_view_request, require_role};
use crate::services::notification_service::NotificationService;
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::normalize_optional;

fn with_actions(request: AmbulanceRequest, actor: &Actor) -> AmbulanceRequestResponse {
    let actions = available_actions(&request, actor);
    AmbulanceRequestResponse { request, actions }
}

async fn lock_request(conn: &mut PgConnection, id: Uuid) -> Result<AmbulanceRequest, AppError> {
    AmbulanceRequestRepository::lock_by_id(conn, id)
        .await?
        .ok_or_else(|| not_found_error("Ambulance request", &id))
}

pub struct AmbulanceRequestController {
    pool: PgPool,
    repository: AmbulanceRequestRepository,
    users: UserRepository,
    notifications: NotificationService,
}

impl AmbulanceRequestController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AmbulanceRequestRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            notifications: NotificationService::new(pool.clone()),
            pool,
        }
    }

    async fn find(&self, id: Uuid) -> Result<AmbulanceRequest, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Ambulance request", &id))
    }

    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateAmbulanceRequest,
    ) -> Result<AmbulanceRequestResponse, AppError> {
        require_role(
            actor,
            &[UserRole::Customer, UserRole::Staff, UserRole::Admin],
            "create ambulance request",
        )?;
        request.validate()?;

        let mut new_request = AmbulanceRequest::new(
            actor.user_id,
            request.patient_name.trim().to_string(),
            request.patient_phone.trim().to_string(),
            request.pickup_address.trim().to_string(),
            request.emergency_type.trim().to_string(),
        );
        new_request.destination_address = normalize_optional(request.destination_address);
        new_request.condition_description = normalize_optional(request.condition_description);
        new_request.priority = request.priority.unwrap_or_default();

        let saved = self.repository.create(&new_request).await?;
        info!(
            "🚑 Solicitud {} creada por {} (prioridad {:?})",
            saved.id, actor.user_id, saved.priority
        );

        self.notifications.request_created(&saved).await;
        Ok(with_actions(saved, actor))
    }

    pub async fn list(
        &self,
        actor: &Actor,
        query: AmbulanceListQuery,
    ) -> Result<Vec<AmbulanceRequestResponse>, AppError> {
        require_role(
            actor,
            &[UserRole::Customer, UserRole::Staff, UserRole::Admin, UserRole::Doctor],
            "list ambulance requests",
        )?;

        let filter = RequestFilter::from(query);
        let requester = (actor.role == UserRole::Customer).then_some(actor.user_id);
        let requests = self.repository.list(&filter, requester).await?;

        Ok(requests
            .into_iter()
            .map(|r| with_actions(r, actor))
            .collect())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<AmbulanceRequestResponse, AppError> {
        let request = self.find(id).await?;
        if !can_view_request(actor, &request) {
            return Err(AppError::Forbidden(
                "No tienes permiso para ver esta solicitud".to_string(),
            ));
        }
        Ok(with_actions(request, actor))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateAmbulanceRequest,
    ) -> Result<AmbulanceRequestResponse, AppError> {
        changes.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = lock_request(&mut tx, id).await?;

        if !can_edit_request(actor, &current) {
            return Err(AppError::Forbidden(
                "No tienes permiso para editar esta solicitud".to_string(),
            ));
        }
        if current.status != RequestStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Only pending requests can be edited, request is {}",
                current.status
            )));
        }

        let updated = AmbulanceRequestRepository::update_details(&mut tx, id, &changes).await?;
        tx.commit().await?;

        Ok(with_actions(updated, actor))
    }

    /// "Asignarme": reclamo atómico de una solicitud pendiente
    pub async fn assign(
        &self,
        actor: &Actor,
        id: Uuid,
        request: AssignRequest,
    ) -> Result<AmbulanceRequestResponse, AppError> {
        let staff_id = request.staff_id.unwrap_or(actor.user_id);

        let current = self.find(id).await?;
        ambulance_workflow::check_claim(&current, actor, staff_id)?;

        if staff_id != actor.user_id {
            match self.users.find_role(staff_id).await? {
                Some(UserRole::Staff) => {}
                Some(_) => {
                    return Err(AppError::BadRequest(
                        "Requests can only be assigned to staff members".to_string(),
                    ))
                }
                None => return Err(not_found_error("User", &staff_id)),
            }
        }

        // La condición del UPDATE serializa reclamos concurrentes
        let claimed = self.repository.claim(id, staff_id).await?.ok_or_else(|| {
            warn!("⚠️ Reclamo concurrente perdido sobre la solicitud {}", id);
            AppError::Conflict("Request is already assigned to a staff member".to_string())
        })?;
        info!("✅ Solicitud {} asignada a {}", id, staff_id);

        self.notifications.request_claimed(&claimed, &actor.name).await;
        Ok(with_actions(claimed, actor))
    }

    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        target: RequestStatus,
    ) -> Result<AmbulanceRequestResponse, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_request(&mut tx, id).await?;

        ambulance_workflow::check_status_change(&current, actor, target)?;
        let updated = AmbulanceRequestRepository::set_status(&mut tx, id, target).await?;

        // Al cerrar la solicitud la ambulancia vuelve a estar disponible
        if target.is_terminal() {
            if let Some(ambulance_id) = updated.assigned_ambulance_id {
                if let Some(ambulance) = AmbulanceRepository::lock_by_id(&mut tx, ambulance_id).await? {
                    if ambulance.current_request_id == Some(id) {
                        AmbulanceRepository::set_binding(&mut tx, ambulance_id, None).await?;
                        info!("🅿️ Ambulancia {} liberada", ambulance.registration_number);
                    }
                }
            }
        }
        tx.commit().await?;
        info!("🔄 Solicitud {}: {} → {}", id, current.status, target);

        self.notifications.status_changed(&updated).await;
        Ok(with_actions(updated, actor))
    }

    pub async fn forward(
        &self,
        actor: &Actor,
        id: Uuid,
        request: ForwardRequest,
    ) -> Result<AmbulanceRequestResponse, AppError> {
        require_role(actor, &[UserRole::Staff, UserRole::Admin], "forward request")?;

        let hospital_role = self
            .users
            .find_role(request.hospital_id)
            .await?
            .ok_or_else(|| not_found_error("Hospital", &request.hospital_id))?;

        let mut tx = self.pool.begin().await?;
        let current = lock_request(&mut tx, id).await?;
        ambulance_workflow::check_forward(&current, actor, hospital_role)?;

        let forwarded =
            AmbulanceRequestRepository::forward(&mut tx, id, request.hospital_id, actor.user_id)
                .await?;
        tx.commit().await?;
        info!("📨 Solicitud {} reenviada al hospital {}", id, request.hospital_id);

        self.notifications
            .request_forwarded(&forwarded, request.hospital_id)
            .await;
        Ok(with_actions(forwarded, actor))
    }

    pub async fn forwarded_requests(
        &self,
        actor: &Actor,
    ) -> Result<Vec<AmbulanceRequestResponse>, AppError> {
        require_role(actor, &[UserRole::Hospital], "list forwarded requests")?;

        let requests = self.repository.list_forwarded(actor.user_id).await?;
        Ok(requests
            .into_iter()
            .map(|r| with_actions(r, actor))
            .collect())
    }

    /// Aceptar (con ambulancia) o rechazar (con notas) una solicitud reenviada.
    /// La aceptación vincula solicitud y ambulancia en la misma transacción.
    pub async fn hospital_response(
        &self,
        actor: &Actor,
        id: Uuid,
        request: HospitalResponseRequest,
    ) -> Result<AmbulanceRequestResponse, AppError> {
        require_role(actor, &[UserRole::Hospital], "respond to forwarded request")?;
        request.validate()?;
        ambulance_workflow::check_response_payload(
            request.response,
            request.ambulance_id,
            request.notes.as_deref(),
        )?;

        let notes = normalize_optional(request.notes);

        let mut tx = self.pool.begin().await?;
        let current = lock_request(&mut tx, id).await?;

        let ambulance = match (request.response, request.ambulance_id) {
            (HospitalResponse::Accepted, Some(ambulance_id)) => Some(
                AmbulanceRepository::lock_by_id(&mut tx, ambulance_id)
                    .await?
                    .ok_or_else(|| not_found_error("Ambulance", &ambulance_id))?,
            ),
            _ => None,
        };

        ambulance_workflow::check_hospital_response(
            &current,
            actor,
            request.response,
            ambulance.as_ref(),
            notes.as_deref(),
        )?;

        let mut updated = AmbulanceRequestRepository::record_hospital_response(
            &mut tx,
            id,
            request.response,
            notes.as_deref(),
        )
        .await?;

        if let Some(ambulance) = &ambulance {
            AmbulanceRepository::set_binding(&mut tx, ambulance.id, Some(id)).await?;
            updated = AmbulanceRequestRepository::set_ambulance(&mut tx, id, Some(ambulance.id)).await?;
        }
        tx.commit().await?;
        info!(
            "🏥 Hospital {} respondió {:?} a la solicitud {}",
            actor.user_id, request.response, id
        );

        self.notifications
            .hospital_responded(&updated, &actor.name)
            .await;
        if let Some(ambulance) = &ambulance {
            self.notifications
                .ambulance_assigned(&updated, &ambulance.registration_number)
                .await;
        }
        Ok(with_actions(updated, actor))
    }

    pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> Result<AmbulanceRequestResponse, AppError> {
        require_role(actor, &[UserRole::Hospital], "mark request as read")?;

        let current = self.find(id).await?;
        if !current.is_forwarded_to(actor.user_id) {
            return Err(AppError::Forbidden(
                "Request was not forwarded to this hospital".to_string(),
            ));
        }

        let updated = self.repository.mark_read(id).await?;
        Ok(with_actions(updated, actor))
    }
}
