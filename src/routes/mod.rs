//! Rutas HTTP
//! 
//! Cada recurso expone su router; `create_app` los monta con autenticación
//! y las capas transversales.

pub mod ambulance_routes;
pub mod auth_routes;
pub mod hospital_routes;
pub mod notification_routes;

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{auth_middleware, cors_middleware};
use crate::state::AppState;

/// Router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/auth", auth_routes::create_session_router())
        .nest("/api/ambulance", ambulance_routes::create_ambulance_router())
        .nest("/api/hospital", hospital_routes::create_hospital_router())
        .nest("/api/notifications", notification_routes::create_notification_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes::create_public_auth_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_middleware(&state.config.cors_origins)),
        )
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "hospital_ops",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
