use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::fleet_dto::UpdateAmbulanceUnitRequest;
use crate::models::{Ambulance, AmbulanceStatus};
use crate::utils::errors::AppError;

pub struct AmbulanceRepository {
    pool: PgPool,
}

impl AmbulanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, ambulance: &Ambulance) -> Result<Ambulance, AppError> {
        let created = sqlx::query_as::<_, Ambulance>(
            r#"
            INSERT INTO ambulances (
                id, hospital_id, registration_number, ambulance_type, driver_name,
                driver_phone, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(ambulance.id)
        .bind(ambulance.hospital_id)
        .bind(&ambulance.registration_number)
        .bind(ambulance.ambulance_type)
        .bind(&ambulance.driver_name)
        .bind(&ambulance.driver_phone)
        .bind(ambulance.status)
        .bind(ambulance.created_at)
        .bind(ambulance.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Ambulance>, AppError> {
        let ambulance = sqlx::query_as::<_, Ambulance>("SELECT * FROM ambulances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ambulance)
    }

    /// Leer y bloquear la fila hasta el fin de la transacción
    pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Ambulance>, AppError> {
        let ambulance =
            sqlx::query_as::<_, Ambulance>("SELECT * FROM ambulances WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(ambulance)
    }

    pub async fn find_by_hospital(
        &self,
        hospital_id: Uuid,
        status: Option<AmbulanceStatus>,
    ) -> Result<Vec<Ambulance>, AppError> {
        let ambulances = sqlx::query_as::<_, Ambulance>(
            r#"
            SELECT * FROM ambulances
            WHERE hospital_id = $1 AND ($2::ambulance_status IS NULL OR status = $2)
            ORDER BY registration_number
            "#,
        )
        .bind(hospital_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(ambulances)
    }

    pub async fn registration_exists(
        &self,
        hospital_id: Uuid,
        registration_number: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM ambulances
                WHERE hospital_id = $1 AND registration_number = $2
                AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(hospital_id)
        .bind(registration_number)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        changes: &UpdateAmbulanceUnitRequest,
    ) -> Result<Ambulance, AppError> {
        let ambulance = sqlx::query_as::<_, Ambulance>(
            r#"
            UPDATE ambulances
            SET registration_number = COALESCE($2, registration_number),
                ambulance_type = COALESCE($3, ambulance_type),
                driver_name = COALESCE($4, driver_name),
                driver_phone = COALESCE($5, driver_phone),
                status = COALESCE($6, status),
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.registration_number)
        .bind(changes.ambulance_type)
        .bind(&changes.driver_name)
        .bind(&changes.driver_phone)
        .bind(changes.status)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(ambulance)
    }

    /// Vincular (`Some`) o liberar (`None`) la ambulancia de una solicitud
    pub async fn set_binding(
        conn: &mut PgConnection,
        id: Uuid,
        request_id: Option<Uuid>,
    ) -> Result<Ambulance, AppError> {
        let status = if request_id.is_some() {
            AmbulanceStatus::Assigned
        } else {
            AmbulanceStatus::Available
        };

        let ambulance = sqlx::query_as::<_, Ambulance>(
            r#"
            UPDATE ambulances
            SET status = $2, current_request_id = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(request_id)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(ambulance)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM ambulances WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
