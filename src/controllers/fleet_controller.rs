use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::fleet_dto::{CreateAmbulanceUnitRequest, UpdateAmbulanceUnitRequest};
use crate::models::{Actor, Ambulance, AmbulanceRequest, AmbulanceStatus, UserRole};
use crate::repositories::ambulance_repository::AmbulanceRepository;
use crate::repositories::ambulance_request_repository::AmbulanceRequestRepository;
use crate::services::ambulance_workflow;
use crate::services::authorization_service::require_role;
use crate::services::notification_service::NotificationService;
use crate::utils::errors::{conflict_error, not_found_error, AppError};
use crate::utils::validation::normalize_optional;

/// Flota de ambulancias de un hospital
pub struct FleetController {
    pool: PgPool,
    repository: AmbulanceRepository,
    notifications: NotificationService,
}

impl FleetController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AmbulanceRepository::new(pool.clone()),
            notifications: NotificationService::new(pool.clone()),
            pool,
        }
    }

    /// Cargar una ambulancia y verificar que pertenece al hospital
    async fn find_owned(&self, actor: &Actor, id: Uuid) -> Result<Ambulance, AppError> {
        require_role(actor, &[UserRole::Hospital], "manage ambulances")?;

        let ambulance = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Ambulance", &id))?;
        ensure_owner(&ambulance, actor)?;
        Ok(ambulance)
    }

    /// Igual que `find_owned` pero bloqueando la fila dentro de la transacción
    async fn lock_owned(
        conn: &mut PgConnection,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Ambulance, AppError> {
        let ambulance = AmbulanceRepository::lock_by_id(conn, id)
            .await?
            .ok_or_else(|| not_found_error("Ambulance", &id))?;
        ensure_owner(&ambulance, actor)?;
        Ok(ambulance)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<AmbulanceStatus>,
    ) -> Result<Vec<Ambulance>, AppError> {
        require_role(actor, &[UserRole::Hospital], "list ambulances")?;
        self.repository.find_by_hospital(actor.user_id, status).await
    }

    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateAmbulanceUnitRequest,
    ) -> Result<Ambulance, AppError> {
        require_role(actor, &[UserRole::Hospital], "add ambulance")?;
        request.validate()?;

        let registration = request.registration_number.trim().to_uppercase();
        if self
            .repository
            .registration_exists(actor.user_id, &registration, None)
            .await?
        {
            return Err(conflict_error("Ambulance", "registration", &registration));
        }

        let ambulance = Ambulance::new(
            actor.user_id,
            registration,
            request.ambulance_type,
            request.driver_name.trim().to_string(),
            normalize_optional(request.driver_phone),
        );
        let saved = self.repository.create(&ambulance).await?;
        info!("🚑 Ambulancia {} añadida a la flota de {}", saved.registration_number, actor.user_id);

        Ok(saved)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Ambulance, AppError> {
        self.find_owned(actor, id).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        mut changes: UpdateAmbulanceUnitRequest,
    ) -> Result<Ambulance, AppError> {
        require_role(actor, &[UserRole::Hospital], "update ambulance")?;
        changes.validate()?;

        if changes.status == Some(AmbulanceStatus::Assigned) {
            return Err(AppError::BadRequest(
                "Ambulances are assigned through a request, not by status".to_string(),
            ));
        }

        if let Some(registration) = changes.registration_number.take() {
            let registration = registration.trim().to_uppercase();
            if self
                .repository
                .registration_exists(actor.user_id, &registration, Some(id))
                .await?
            {
                return Err(conflict_error("Ambulance", "registration", &registration));
            }
            changes.registration_number = Some(registration);
        }

        // El estado se comprueba con la fila bloqueada: una aceptación
        // concurrente no puede colarse entre la comprobación y la escritura
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_owned(&mut tx, actor, id).await?;
        if changes.status.is_some() && current.status == AmbulanceStatus::Assigned {
            return Err(AppError::Conflict(
                "Ambulance is assigned; park it before changing its status".to_string(),
            ));
        }

        let updated = AmbulanceRepository::update(&mut tx, id, &changes).await?;
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        require_role(actor, &[UserRole::Hospital], "delete ambulance")?;

        let mut tx = self.pool.begin().await?;
        let current = Self::lock_owned(&mut tx, actor, id).await?;
        if current.status == AmbulanceStatus::Assigned {
            return Err(AppError::Conflict(
                "Cannot delete an assigned ambulance".to_string(),
            ));
        }

        AmbulanceRepository::delete(&mut tx, id).await?;
        tx.commit().await?;
        info!("🗑️ Ambulancia {} eliminada", current.registration_number);
        Ok(())
    }

    /// Aparcar: devuelve la ambulancia al pool y deshace el vínculo con la solicitud
    pub async fn park(&self, actor: &Actor, id: Uuid) -> Result<Ambulance, AppError> {
        let snapshot = self.find_owned(actor, id).await?;
        ambulance_workflow::check_park(&snapshot, actor)?;

        // Orden de bloqueo: solicitud antes que ambulancia
        let mut tx = self.pool.begin().await?;
        let request = match snapshot.current_request_id {
            Some(request_id) => AmbulanceRequestRepository::lock_by_id(&mut tx, request_id).await?,
            None => None,
        };
        let ambulance = AmbulanceRepository::lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Ambulance", &id))?;

        ambulance_workflow::check_park(&ambulance, actor)?;
        if ambulance.current_request_id != snapshot.current_request_id {
            return Err(AppError::Conflict(
                "Ambulance assignment changed, please retry".to_string(),
            ));
        }

        if let Some(request) = request.filter(|r| !r.status.is_terminal()) {
            if request.assigned_ambulance_id == Some(id) {
                AmbulanceRequestRepository::set_ambulance(&mut tx, request.id, None).await?;
            }
        }
        let parked = AmbulanceRepository::set_binding(&mut tx, id, None).await?;
        tx.commit().await?;
        info!("🅿️ Ambulancia {} aparcada", parked.registration_number);

        Ok(parked)
    }

    /// Vincular una ambulancia disponible a una solicitud ya aceptada
    pub async fn assign(
        &self,
        actor: &Actor,
        id: Uuid,
        request_id: Uuid,
    ) -> Result<(Ambulance, AmbulanceRequest), AppError> {
        require_role(actor, &[UserRole::Hospital], "assign ambulance")?;

        let mut tx = self.pool.begin().await?;
        let request = AmbulanceRequestRepository::lock_by_id(&mut tx, request_id)
            .await?
            .ok_or_else(|| not_found_error("Ambulance request", &request_id))?;
        let ambulance = AmbulanceRepository::lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| not_found_error("Ambulance", &id))?;

        ambulance_workflow::check_fleet_assignment(&request, actor, &ambulance)?;

        let ambulance = AmbulanceRepository::set_binding(&mut tx, id, Some(request_id)).await?;
        let request = AmbulanceRequestRepository::set_ambulance(&mut tx, request_id, Some(id)).await?;
        tx.commit().await?;
        info!(
            "🚑 Ambulancia {} asignada a la solicitud {}",
            ambulance.registration_number, request_id
        );

        self.notifications
            .ambulance_assigned(&request, &ambulance.registration_number)
            .await;
        Ok((ambulance, request))
    }
}

fn ensure_owner(ambulance: &Ambulance, actor: &Actor) -> Result<(), AppError> {
    if ambulance.hospital_id != actor.user_id {
        return Err(AppError::Forbidden(
            "No tienes permiso para acceder a esta ambulancia".to_string(),
        ));
    }
    Ok(())
}
