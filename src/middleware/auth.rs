//! Middleware de autenticación JWT
//! 
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y la inyección del actor autenticado en la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    models::Actor,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Middleware de autenticación JWT. Deja un `Actor` en las extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;

    // Decodificar y validar JWT
    let actor: Actor = verify_token(token, &state.jwt)?.into_actor()?;
    tracing::debug!("🔐 {} ({}) autenticado", actor.user_id, actor.role);

    // Inyectar actor autenticado en las extensions
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}
