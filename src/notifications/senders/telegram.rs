use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{SenderError, TelegramApi};
use crate::notifications::models::{ParseMode, TelegramResponse, Update, WebhookInfo};

/// A sender for pushing notifications via the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramSender {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl TelegramSender {
    pub fn new(client: Client, api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Escapes text for Telegram MarkdownV2.
    /// Characters to escape: _ * [ ] ( ) ~ ` > # + - = | { } . ! \
    pub fn escape_markdown_v2(text: &str) -> String {
        let mut escaped_text = String::with_capacity(text.len());
        for char_to_escape in text.chars() {
            match char_to_escape {
                '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
                | '|' | '{' | '}' | '.' | '!' | '\\' => {
                    escaped_text.push('\\');
                    escaped_text.push(char_to_escape);
                }
                _ => {
                    escaped_text.push(char_to_escape);
                }
            }
        }
        escaped_text
    }

    /// Decodes a Bot API reply, turning `ok: false` or a non-success status
    /// into [`SenderError::Api`].
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SenderError> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<TelegramResponse<T>>(&body) {
            Ok(TelegramResponse {
                ok: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Ok(reply) => Err(SenderError::Api {
                error_code: reply.error_code.unwrap_or(i64::from(status.as_u16())),
                description: reply.description.unwrap_or(body),
            }),
            Err(_) if !status.is_success() => Err(SenderError::Api {
                error_code: i64::from(status.as_u16()),
                description: body,
            }),
            Err(e) => Err(SenderError::InvalidResponse(format!("{e}: {body}"))),
        }
    }
}

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Serialize)]
struct GetUpdatesPayload<'a> {
    offset: i64,
    timeout: u32,
    allowed_updates: &'a [&'a str],
}

#[async_trait]
impl TelegramApi for TelegramSender {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), SenderError> {
        let payload = SendMessagePayload {
            chat_id,
            text,
            parse_mode: parse_mode.as_ref().map(ParseMode::as_str),
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;
        Self::decode::<serde_json::Value>(response).await.map(|_| ())
    }

    async fn set_webhook(&self, url: &str) -> Result<serde_json::Value, SenderError> {
        let response = self
            .client
            .post(self.method_url("setWebhook"))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        // The caller relays Telegram's verdict, including `ok: false`.
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SenderError::InvalidResponse(format!("{e}: {body}")))
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo, SenderError> {
        let response = self
            .client
            .get(self.method_url("getWebhookInfo"))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, SenderError> {
        let payload = GetUpdatesPayload {
            offset,
            timeout: 0,
            allowed_updates: &["message"],
        };
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&payload)
            .send()
            .await?;
        Self::decode(response).await
    }
}
