//! Middleware de autenticación JWT
//!
//! Resuelve el principal a partir del bearer token. El rol y el estado de
//! licencia se leen del repositorio de usuarios, no de los claims.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    models::principal::Principal,
    models::user::Role,
    state::AppState,
    utils::errors::AppError,
    utils::jwt::{extract_bearer_token, verify_token},
};

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or(AppError::Unauthenticated)?;

    // Decodificar y validar JWT
    let claims = verify_token(token, &state.jwt)?;
    let user_id = claims.user_id()?;

    // Verificar que el usuario existe
    let user = state.users.get_user(user_id).await?.ok_or_else(|| {
        tracing::debug!("Token válido para un usuario inexistente: {}", user_id);
        AppError::Unauthenticated
    })?;

    let principal = Principal::from(&user);
    if Role::from_str(&claims.role) != Some(principal.kind()) {
        tracing::debug!("Rol del token desactualizado para {}: se usa {:?}", user.id, principal.kind());
    }

    // Inyectar el principal en las extensions
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
