use async_trait::async_trait;
use thiserror::Error;

use super::models::{ParseMode, Update, WebhookInfo};

pub mod telegram;

/// Telegram's error code when the user has blocked the bot.
pub const BLOCKED_ERROR_CODE: i64 = 403;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Telegram API error {error_code}: {description}")]
    Api { error_code: i64, description: String },
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Unexpected response from Telegram: {0}")]
    InvalidResponse(String),
}

impl SenderError {
    /// True when the chat has blocked the bot and should stop receiving messages.
    pub fn is_blocked(&self) -> bool {
        matches!(self, SenderError::Api { error_code, .. } if *error_code == BLOCKED_ERROR_CODE)
    }
}

/// The Bot API calls the notification service depends on.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), SenderError>;

    /// Returns Telegram's reply as-is.
    async fn set_webhook(&self, url: &str) -> Result<serde_json::Value, SenderError>;

    async fn get_webhook_info(&self) -> Result<WebhookInfo, SenderError>;

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, SenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_403_counts_as_blocked() {
        let blocked = SenderError::Api {
            error_code: 403,
            description: "Forbidden: bot was blocked by the user".to_string(),
        };
        let bad_request = SenderError::Api {
            error_code: 400,
            description: "Bad Request: chat not found".to_string(),
        };
        assert!(blocked.is_blocked());
        assert!(!bad_request.is_blocked());
        assert!(!SenderError::InvalidResponse("x".to_string()).is_blocked());
    }
}
