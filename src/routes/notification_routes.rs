use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::controllers::notification_controller::NotificationController;
use crate::models::{Actor, NotificationList};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/mark-all-read", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<NotificationList>, AppError> {
    let controller = NotificationController::new(state.pool.clone());
    Ok(Json(controller.list(&actor).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = NotificationController::new(state.pool.clone());
    controller.mark_read(&actor, id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn mark_all_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = NotificationController::new(state.pool.clone());
    let updated = controller.mark_all_read(&actor).await?;
    Ok(Json(json!({ "success": true, "updated": updated })))
}
