use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;

use crate::web::{
    AppError, AppState,
    models::{UserSearchQuery, UserStats, UserStatsResponse, UsersResponse},
};

/// Read-only admin endpoints. Layer `auth` and `require_admin` on top.
pub fn create_admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/applications", get(list_applications))
        .route("/logs", get(list_logs))
        .route("/user-stats/{user_id}", get(user_stats))
}

async fn list_users(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<UserSearchQuery>,
) -> Json<UsersResponse> {
    let users = app_state
        .users
        .list(query.search.as_deref())
        .await
        .iter()
        .map(|u| u.summary_with_created_at())
        .collect();

    Json(UsersResponse {
        success: true,
        users,
    })
}

// Applications and logs have no backing store yet.
async fn list_applications() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true, "applications": [] }))
}

async fn list_logs() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true, "logs": [] }))
}

async fn user_stats(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStatsResponse>, AppError> {
    let not_found = || AppError::NotFound(t!("user.not_found").to_string());

    let id: i32 = user_id.trim().parse().map_err(|_| not_found())?;
    let user = app_state.users.find_by_id(id).await.ok_or_else(not_found)?;

    Ok(Json(UserStatsResponse {
        success: true,
        stats: UserStats {
            user_id: user.id,
            total_applications: 0,
            total_spent: 0,
            active_campaigns: 0,
        },
    }))
}
