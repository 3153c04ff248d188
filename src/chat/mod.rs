use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::server::config::ServerConfig;

pub mod prompt;

pub use prompt::SYSTEM_PROMPT;

/// Number of prior turns forwarded with each request.
pub const HISTORY_WINDOW: usize = 10;
pub const TEMPERATURE: f32 = 0.8;
pub const MAX_TOKENS: u32 = 1000;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Completion API key is not configured")]
    NotConfigured,
    #[error("Completion API returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed completion response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// System prompt, the last [`HISTORY_WINDOW`] turns of `conversation`, then
/// the new user message.
pub fn build_messages(message: &str, conversation: &[ChatMessage]) -> Vec<ChatMessage> {
    let start = conversation.len().saturating_sub(HISTORY_WINDOW);
    let mut messages = Vec::with_capacity(conversation.len() - start + 2);
    messages.push(ChatMessage::new("system", SYSTEM_PROMPT));
    messages.extend_from_slice(&conversation[start..]);
    messages.push(ChatMessage::new("user", message));
    messages
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the assistant text of the first choice, if there is one.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, ChatError>;
}

/// Chat completions over the OpenAI HTTP API.
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(client: Client, config: &ServerConfig) -> Self {
        Self {
            client,
            api_url: config.openai_api_url.clone(),
            api_key: config
                .openai_key_configured()
                .then(|| config.openai_api_key.clone()),
            model: config.openai_model.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Completion API error.");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::InvalidResponse(format!("{e}: {body}")))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::{HeaderMap, StatusCode}, routing::post};

    fn turns(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| ChatMessage::new(if i % 2 == 0 { "user" } else { "assistant" }, format!("turn {i}")))
            .collect()
    }

    #[test]
    fn keeps_only_last_ten_turns() {
        let messages = build_messages("new question", &turns(14));
        assert_eq!(messages.len(), HISTORY_WINDOW + 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].content, "turn 4");
        assert_eq!(messages[HISTORY_WINDOW].content, "turn 13");
        assert_eq!(messages.last().unwrap(), &ChatMessage::new("user", "new question"));
    }

    #[test]
    fn short_history_is_kept_whole() {
        let messages = build_messages("hi", &turns(3));
        assert_eq!(messages.len(), 5);
        assert!(build_messages("hi", &[]).len() == 2);
    }

    async fn fake_completion(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> (StatusCode, Json<serde_json::Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if auth != "Bearer sk-test" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": { "message": "bad key" } })),
            );
        }
        let last = body["messages"].as_array().unwrap().last().unwrap()["content"].clone();
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": format!("echo: {}", last.as_str().unwrap()) } }],
                "model": body["model"],
                "max_tokens": body["max_tokens"],
            })),
        )
    }

    async fn spawn_fake_api() -> String {
        let app = Router::new().route("/v1/chat/completions", post(fake_completion));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    fn config(url: String, key: &str) -> ServerConfig {
        ServerConfig {
            openai_api_url: url,
            openai_api_key: key.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn relays_first_choice() {
        let url = spawn_fake_api().await;
        let client = OpenAiClient::new(Client::new(), &config(url, "sk-test"));
        let reply = client.complete(&build_messages("привет", &[])).await.unwrap();
        assert_eq!(reply.as_deref(), Some("echo: привет"));
    }

    #[tokio::test]
    async fn upstream_failure_keeps_raw_body() {
        let url = spawn_fake_api().await;
        let client = OpenAiClient::new(Client::new(), &config(url, "sk-wrong"));
        let err = client.complete(&build_messages("hi", &[])).await.unwrap_err();
        match err {
            ChatError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn placeholder_key_is_not_configured() {
        let client = OpenAiClient::new(Client::new(), &ServerConfig::default());
        let err = client.complete(&build_messages("hi", &[])).await.unwrap_err();
        assert!(matches!(err, ChatError::NotConfigured));
    }
}
