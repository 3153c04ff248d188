use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;
use tracing::warn;

use crate::notifications::models::ContactSubmission;
use crate::web::{
    AppError, AppState,
    error::json_body,
    models::{ContactRequest, ContactResponse},
};

pub async fn submit_contact(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, AppError> {
    let payload = json_body(payload, t!("contact.fields_required"))?;
    let submission = validate(payload)?;
    let service = &app_state.notification_service;

    if service.registry().is_empty() {
        warn!("No registered Telegram chats to notify about a contact request.");
        return Ok(Json(ContactResponse {
            success: true,
            message: t!("contact.no_chats").to_string(),
            sent: None,
            errors: None,
        }));
    }

    let report = service.broadcast_contact(&submission).await;
    Ok(Json(ContactResponse {
        success: true,
        message: t!("contact.sent", count = report.sent).to_string(),
        sent: Some(report.sent),
        errors: Some(report.errors),
    }))
}

fn validate(payload: ContactRequest) -> Result<ContactSubmission, AppError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    let message = payload.message.trim();
    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::InvalidInput(t!("contact.fields_required").to_string()));
    }

    Ok(ContactSubmission {
        name: name.to_string(),
        email: email.to_string(),
        phone: payload
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        message: message.to_string(),
    })
}
