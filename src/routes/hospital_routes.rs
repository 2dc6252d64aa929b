use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::controllers::fleet_controller::FleetController;
use crate::dto::fleet_dto::{CreateAmbulanceUnitRequest, FleetListQuery, UpdateAmbulanceUnitRequest};
use crate::dto::ApiResponse;
use crate::models::{Actor, Ambulance};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::{JsonBody, QueryParams};

pub fn create_hospital_router() -> Router<AppState> {
    Router::new()
        .route("/ambulances", get(list_ambulances).post(create_ambulance))
        .route(
            "/ambulances/:id",
            get(get_ambulance).put(update_ambulance).delete(delete_ambulance),
        )
        .route("/ambulances/:id/park", post(park_ambulance))
        .route("/ambulances/:id/assign/:request_id", post(assign_ambulance))
}

async fn list_ambulances(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    QueryParams(query): QueryParams<FleetListQuery>,
) -> Result<Json<Vec<Ambulance>>, AppError> {
    let controller = FleetController::new(state.pool.clone());
    Ok(Json(controller.list(&actor, query.status).await?))
}

async fn create_ambulance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(request): JsonBody<CreateAmbulanceUnitRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Ambulance>>), AppError> {
    let controller = FleetController::new(state.pool.clone());
    let created = controller.create(&actor, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(created, "Ambulancia creada exitosamente")),
    ))
}

async fn get_ambulance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ambulance>, AppError> {
    let controller = FleetController::new(state.pool.clone());
    Ok(Json(controller.get(&actor, id).await?))
}

async fn update_ambulance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateAmbulanceUnitRequest>,
) -> Result<Json<ApiResponse<Ambulance>>, AppError> {
    let controller = FleetController::new(state.pool.clone());
    let updated = controller.update(&actor, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Ambulancia actualizada exitosamente",
    )))
}

async fn delete_ambulance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = FleetController::new(state.pool.clone());
    controller.delete(&actor, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Ambulancia eliminada exitosamente"
    })))
}

async fn park_ambulance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Ambulance>>, AppError> {
    let controller = FleetController::new(state.pool.clone());
    let parked = controller.park(&actor, id).await?;
    Ok(Json(ApiResponse::success_with_message(parked, "Ambulancia aparcada")))
}

async fn assign_ambulance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = FleetController::new(state.pool.clone());
    let (ambulance, request) = controller.assign(&actor, id, request_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Ambulancia asignada exitosamente",
        "data": { "ambulance": ambulance, "request": request }
    })))
}
