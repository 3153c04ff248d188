use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::chat::{ChatMessage, build_messages};
use crate::web::{AppError, AppState, error::json_body};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation: Vec<ChatMessage>,
}

/// Every reply, including errors, must bypass caches.
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let mut response = match relay(&app_state, payload).await {
        Ok(message) => Json(serde_json::json!({ "success": true, "message": message })).into_response(),
        Err(e) => e.into_response(),
    };

    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

async fn relay(
    app_state: &AppState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<String, AppError> {
    let payload = json_body(payload, t!("chat.empty_message"))?;
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::InvalidInput(t!("chat.empty_message").to_string()));
    }

    let messages = build_messages(message, &payload.conversation);
    let reply = app_state.chat_client.complete(&messages).await.inspect_err(|e| {
        tracing::error!(error = %e, "Chat completion failed.");
    })?;

    Ok(reply
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| t!("chat.fallback_reply").to_string()))
}
