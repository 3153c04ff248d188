use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use std::sync::Arc;
use tracing::error;

use crate::notifications::models::Update;
use crate::web::{
    AppError, AppState,
    models::{GetUpdatesQuery, GetUpdatesResponse, RegisteredChatsResponse, SetupWebhookQuery},
};

pub fn create_telegram_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/setup-webhook", get(setup_webhook))
        .route("/get-registered-chats", get(get_registered_chats))
        .route("/get-updates", get(get_updates))
}

async fn webhook_handler(
    State(app_state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> Json<serde_json::Value> {
    app_state.notification_service.handle_update(&update).await;
    Json(serde_json::json!({ "success": true }))
}

/// Points the bot's webhook at `url` and relays Telegram's reply.
async fn setup_webhook(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SetupWebhookQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let url = query
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidInput(t!("telegram.webhook_url_required").to_string()))?;

    let reply = app_state
        .notification_service
        .api()
        .set_webhook(&url)
        .await
        .map_err(|e| {
            error!(error = %e, "Setup webhook error.");
            AppError::Upstream {
                message: t!("telegram.webhook_setup_failed").to_string(),
                details: e.to_string(),
            }
        })?;
    Ok(Json(reply))
}

async fn get_registered_chats(State(app_state): State<Arc<AppState>>) -> Json<RegisteredChatsResponse> {
    let chat_ids = app_state.notification_service.registry().snapshot();
    Json(RegisteredChatsResponse {
        success: true,
        count: chat_ids.len(),
        chat_ids,
    })
}

/// One polling pass, for setups without a public webhook.
async fn get_updates(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<GetUpdatesQuery>,
) -> Result<Json<GetUpdatesResponse>, AppError> {
    let outcome = app_state
        .notification_service
        .poll_once(query.offset)
        .await
        .map_err(|e| {
            error!(error = %e, "Fetching Telegram updates failed.");
            AppError::Upstream {
                message: t!("telegram.updates_failed").to_string(),
                details: e.to_string(),
            }
        })?;

    Ok(Json(GetUpdatesResponse {
        success: true,
        next_offset: outcome.next_offset,
        registered_users: outcome.registered,
    }))
}
