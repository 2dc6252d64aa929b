use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{
    ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest,
};
use crate::dto::ApiResponse;
use crate::models::{Actor, UserResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::JsonBody;

/// Rutas públicas de autenticación
pub fn create_public_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Rutas de autenticación que requieren token
pub fn create_session_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), AppError> {
    let controller = AuthController::new(&state);
    let user = controller.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(user, "Usuario registrado exitosamente")),
    ))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.login(request).await?))
}

async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.forgot_password(request).await?))
}

async fn reset_password(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AuthController::new(&state);
    controller.reset_password(request).await?;
    Ok(Json(ApiResponse::message("Contraseña actualizada exitosamente")))
}

async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<UserResponse>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.me(&actor).await?))
}
