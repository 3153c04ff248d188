use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::sync::Arc;

use crate::{
    services::auth_service,
    web::{
        AppError, AppState,
        error::json_body,
        models::{AuthenticatedUser, LoginRequest, ProfileResponse, RegisterRequest},
    },
};

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/register", post(register_handler))
}

/// Routes that expect [`crate::web::middleware::auth::auth`] to have run.
pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new().route("/profile", get(profile_handler))
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = json_body(payload, t!("auth.login_fields_required"))?;
    let login_response =
        auth_service::login_user(&app_state.users, payload, &app_state.config.jwt_secret).await?;
    tracing::info!(user_id = login_response.user.id, "User logged in.");

    let auth_cookie = Cookie::build(("token", login_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((
        [(header::SET_COOKIE, auth_cookie.to_string())],
        Json(login_response),
    ))
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = json_body(payload, t!("auth.register_fields_required"))?;
    let response =
        auth_service::register_user(&app_state.users, payload, &app_state.config.jwt_secret)
            .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn profile_handler(
    State(app_state): State<Arc<AppState>>,
    user: Extension<AuthenticatedUser>,
) -> Result<Json<ProfileResponse>, AppError> {
    auth_service::profile(&app_state.users, user).await.map(Json)
}
