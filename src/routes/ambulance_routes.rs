use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::ambulance_request_controller::AmbulanceRequestController;
use crate::dto::ambulance_dto::{
    AmbulanceListQuery, AmbulanceRequestResponse, AssignRequest, CreateAmbulanceRequest,
    ForwardRequest, HospitalResponseRequest, UpdateAmbulanceRequest, UpdateStatusRequest,
};
use crate::dto::ApiResponse;
use crate::models::Actor;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::{JsonBody, OptionalJsonBody, QueryParams};

pub fn create_ambulance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/hospital/forwarded-requests", get(forwarded_requests))
        .route("/:id", get(get_request).put(update_request))
        .route("/:id/assign", post(assign_request))
        .route("/:id/status", put(update_status))
        .route("/:id/forward", post(forward_request))
        .route("/:id/hospital-response", post(hospital_response))
        .route("/:id/mark-read", post(mark_read))
}

async fn list_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    QueryParams(query): QueryParams<AmbulanceListQuery>,
) -> Result<Json<Vec<AmbulanceRequestResponse>>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    Ok(Json(controller.list(&actor, query).await?))
}

async fn create_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(request): JsonBody<CreateAmbulanceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AmbulanceRequestResponse>>), AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    let created = controller.create(&actor, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            created,
            "Solicitud de ambulancia registrada",
        )),
    ))
}

async fn get_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<AmbulanceRequestResponse>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    Ok(Json(controller.get(&actor, id).await?))
}

async fn update_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateAmbulanceRequest>,
) -> Result<Json<ApiResponse<AmbulanceRequestResponse>>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    let updated = controller.update(&actor, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Solicitud actualizada exitosamente",
    )))
}

async fn assign_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    OptionalJsonBody(request): OptionalJsonBody<AssignRequest>,
) -> Result<Json<ApiResponse<AmbulanceRequestResponse>>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    let assigned = controller.assign(&actor, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        assigned,
        "Solicitud asignada exitosamente",
    )))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<AmbulanceRequestResponse>>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    let updated = controller.update_status(&actor, id, request.status).await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Estado actualizado exitosamente",
    )))
}

async fn forward_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<ForwardRequest>,
) -> Result<Json<ApiResponse<AmbulanceRequestResponse>>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    let forwarded = controller.forward(&actor, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        forwarded,
        "Solicitud reenviada al hospital",
    )))
}

async fn forwarded_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<AmbulanceRequestResponse>>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    Ok(Json(controller.forwarded_requests(&actor).await?))
}

async fn hospital_response(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<HospitalResponseRequest>,
) -> Result<Json<ApiResponse<AmbulanceRequestResponse>>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    let updated = controller.hospital_response(&actor, id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Respuesta del hospital registrada",
    )))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<AmbulanceRequestResponse>, AppError> {
    let controller = AmbulanceRequestController::new(state.pool.clone());
    Ok(Json(controller.mark_read(&actor, id).await?))
}
