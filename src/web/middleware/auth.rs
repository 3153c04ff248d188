use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

use crate::db::models::Role;
use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    // Try to get token from Authorization header first, then fall back to cookie
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
        .ok_or(AppError::TokenMissing)?;

    let claims = auth_service::decode_token(&token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
        AppError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthenticatedUser::from(claims));
    Ok(next.run(req).await)
}

/// Must be layered inside [`auth`], which provides the user extension.
pub async fn require_admin(req: Request<AxumBody>, next: Next) -> Result<Response, AppError> {
    let is_admin = req
        .extensions()
        .get::<AuthenticatedUser>()
        .is_some_and(|user| user.role == Role::Admin);

    if !is_admin {
        return Err(AppError::Forbidden(t!("auth.admin_required").to_string()));
    }
    Ok(next.run(req).await)
}
