use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::ambulance_dto::UpdateAmbulanceRequest;
use crate::models::{AmbulanceRequest, HospitalResponse, RequestFilter, RequestStatus};
use crate::utils::errors::AppError;

pub struct AmbulanceRequestRepository {
    pool: PgPool,
}

impl AmbulanceRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &AmbulanceRequest) -> Result<AmbulanceRequest, AppError> {
        let created = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            INSERT INTO ambulance_requests (
                id, requester_id, patient_name, patient_phone, pickup_address,
                destination_address, emergency_type, condition_description,
                priority, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(request.requester_id)
        .bind(&request.patient_name)
        .bind(&request.patient_phone)
        .bind(&request.pickup_address)
        .bind(&request.destination_address)
        .bind(&request.emergency_type)
        .bind(&request.condition_description)
        .bind(request.priority)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AmbulanceRequest>, AppError> {
        let request =
            sqlx::query_as::<_, AmbulanceRequest>("SELECT * FROM ambulance_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    /// Leer y bloquear la fila hasta el fin de la transacción
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<AmbulanceRequest>, AppError> {
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            "SELECT * FROM ambulance_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(request)
    }

    /// Listado filtrado; `requester_id` restringe a las solicitudes de un usuario
    pub async fn list(
        &self,
        filter: &RequestFilter,
        requester_id: Option<Uuid>,
    ) -> Result<Vec<AmbulanceRequest>, AppError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM ambulance_requests WHERE TRUE");

        if let Some(requester_id) = requester_id {
            query.push(" AND requester_id = ").push_bind(requester_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", escape_like(&term));
            query.push(" AND (");
            for (i, column) in ["patient_name", "patient_phone", "pickup_address", "emergency_type"]
                .iter()
                .enumerate()
            {
                if i > 0 {
                    query.push(" OR ");
                }
                query
                    .push(*column)
                    .push(" ILIKE ")
                    .push_bind(pattern.clone());
            }
            query.push(")");
        }
        query.push(" ORDER BY created_at DESC");

        let requests = query
            .build_query_as::<AmbulanceRequest>()
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    pub async fn list_forwarded(&self, hospital_id: Uuid) -> Result<Vec<AmbulanceRequest>, AppError> {
        let requests = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            SELECT * FROM ambulance_requests
            WHERE forwarded_hospital_id = $1
            ORDER BY hospital_read ASC, created_at DESC
            "#,
        )
        .bind(hospital_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    pub async fn update_details(
        conn: &mut PgConnection,
        id: Uuid,
        changes: &UpdateAmbulanceRequest,
    ) -> Result<AmbulanceRequest, AppError> {
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            UPDATE ambulance_requests
            SET patient_name = COALESCE($2, patient_name),
                patient_phone = COALESCE($3, patient_phone),
                pickup_address = COALESCE($4, pickup_address),
                destination_address = COALESCE($5, destination_address),
                emergency_type = COALESCE($6, emergency_type),
                condition_description = COALESCE($7, condition_description),
                priority = COALESCE($8, priority),
                updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.patient_name)
        .bind(&changes.patient_phone)
        .bind(&changes.pickup_address)
        .bind(&changes.destination_address)
        .bind(&changes.emergency_type)
        .bind(&changes.condition_description)
        .bind(changes.priority)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    /// Asignación condicional: solo tiene efecto si la solicitud sigue
    /// pendiente y sin staff. `None` indica que otro la reclamó antes.
    pub async fn claim(&self, id: Uuid, staff_id: Uuid) -> Result<Option<AmbulanceRequest>, AppError> {
        let now = Utc::now();
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            UPDATE ambulance_requests
            SET assigned_staff_id = $2, status = $3, assigned_at = $4, updated_at = $4
            WHERE id = $1 AND assigned_staff_id IS NULL AND status = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(staff_id)
        .bind(RequestStatus::Assigned)
        .bind(now)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<AmbulanceRequest, AppError> {
        let now = Utc::now();
        let completed_at = status.is_terminal().then_some(now);
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            UPDATE ambulance_requests
            SET status = $2, completed_at = COALESCE($3, completed_at), updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(completed_at)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    pub async fn forward(
        conn: &mut PgConnection,
        id: Uuid,
        hospital_id: Uuid,
        forwarded_by: Uuid,
    ) -> Result<AmbulanceRequest, AppError> {
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            UPDATE ambulance_requests
            SET forwarded_hospital_id = $2, forwarded_by = $3, hospital_response = $4,
                hospital_notes = NULL, hospital_read = FALSE, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(hospital_id)
        .bind(forwarded_by)
        .bind(HospitalResponse::Pending)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    pub async fn record_hospital_response(
        conn: &mut PgConnection,
        id: Uuid,
        response: HospitalResponse,
        notes: Option<&str>,
    ) -> Result<AmbulanceRequest, AppError> {
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            UPDATE ambulance_requests
            SET hospital_response = $2, hospital_notes = $3, hospital_read = TRUE, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(response)
        .bind(notes)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    pub async fn set_ambulance(
        conn: &mut PgConnection,
        id: Uuid,
        ambulance_id: Option<Uuid>,
    ) -> Result<AmbulanceRequest, AppError> {
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            r#"
            UPDATE ambulance_requests
            SET assigned_ambulance_id = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ambulance_id)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<AmbulanceRequest, AppError> {
        let request = sqlx::query_as::<_, AmbulanceRequest>(
            "UPDATE ambulance_requests SET hospital_read = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }
}

/// Escapar los comodines de LIKE en el término de búsqueda
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
