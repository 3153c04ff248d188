use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::chat_registry::ChatRegistry;
use super::models::{BroadcastReport, ContactSubmission, ParseMode, PollOutcome, Update};
use super::senders::{SenderError, TelegramApi, telegram::TelegramSender};

const START_COMMAND: &str = "/start";

/// Fans contact-form submissions out to every registered Telegram chat and
/// keeps the registry in sync with `/start` commands and blocked chats.
pub struct NotificationService {
    registry: ChatRegistry,
    api: Arc<dyn TelegramApi>,
}

impl NotificationService {
    pub fn new(registry: ChatRegistry, api: Arc<dyn TelegramApi>) -> Self {
        Self { registry, api }
    }

    pub fn registry(&self) -> &ChatRegistry {
        &self.registry
    }

    pub fn api(&self) -> &dyn TelegramApi {
        self.api.as_ref()
    }

    /// Renders the MarkdownV2 notification for a submission. User-supplied
    /// fields are escaped; the phone line is omitted when there is no phone.
    pub fn format_contact_message(submission: &ContactSubmission, now: &DateTime<Local>) -> String {
        let esc = TelegramSender::escape_markdown_v2;
        let mut text = String::from("📋 *Новая заявка с сайта Windexs Реклама*\n\n");
        text.push_str(&format!("👤 *Имя:* {}\n", esc(&submission.name)));
        text.push_str(&format!("📧 *Email:* {}\n", esc(&submission.email)));
        if let Some(phone) = submission.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            text.push_str(&format!("📱 *Телефон:* {}\n", esc(phone)));
        }
        text.push_str(&format!("\n💬 *Сообщение:*\n{}\n\n", esc(&submission.message)));
        text.push_str(&format!(
            "⏰ *Время:* {}",
            esc(&now.format("%d.%m.%Y, %H:%M:%S").to_string())
        ));
        text
    }

    /// Sends the submission to each registered chat independently. A chat that
    /// has blocked the bot is dropped from the registry.
    pub async fn broadcast_contact(&self, submission: &ContactSubmission) -> BroadcastReport {
        let text = Self::format_contact_message(submission, &Local::now());
        let mut report = BroadcastReport::default();

        for chat_id in self.registry.snapshot() {
            match self
                .api
                .send_message(chat_id, &text, Some(ParseMode::MarkdownV2))
                .await
            {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    error!(chat_id, error = %e, "Error sending contact notification.");
                    if e.is_blocked() && self.registry.remove(chat_id) {
                        info!(chat_id, "Removed blocked chat.");
                    }
                    report.errors += 1;
                }
            }
        }

        info!(sent = report.sent, errors = report.errors, "Contact notification fan-out finished.");
        report
    }

    /// Registers the chat behind a `/start` message and greets it. Returns the
    /// chat id when the update was a `/start` command.
    pub async fn handle_update(&self, update: &Update) -> Option<i64> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?;
        if !is_start_command(text) {
            return None;
        }

        let chat_id = message.chat.id;
        if self.registry.register(chat_id) {
            info!(chat_id, "Registered new chat.");
        }

        // Registration stands even if the greeting cannot be delivered.
        if let Err(e) = self
            .api
            .send_message(chat_id, &t!("telegram.welcome"), None)
            .await
        {
            warn!(chat_id, error = %e, "Failed to send welcome message.");
        }

        Some(chat_id)
    }

    /// Pulls pending updates starting at `offset` and handles each one.
    pub async fn poll_once(&self, offset: i64) -> Result<PollOutcome, SenderError> {
        let updates = self.api.get_updates(offset).await?;

        let mut outcome = PollOutcome {
            next_offset: offset,
            registered: Vec::new(),
        };
        for update in &updates {
            outcome.next_offset = outcome.next_offset.max(update.update_id + 1);
            if let Some(chat_id) = self.handle_update(update).await {
                outcome.registered.push(chat_id);
            }
        }
        Ok(outcome)
    }
}

/// `/start`, optionally addressed to the bot (`/start@bot`) or with a payload.
fn is_start_command(text: &str) -> bool {
    let command = text.trim().split_whitespace().next().unwrap_or_default();
    command == START_COMMAND
        || command
            .strip_prefix(START_COMMAND)
            .and_then(|rest| rest.strip_prefix('@'))
            .is_some_and(|bot| !bot.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::notifications::models::{Chat, IncomingMessage, WebhookInfo};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process stand-in for the Bot API.
    #[derive(Default)]
    pub(crate) struct FakeTelegram {
        pub sent: Mutex<Vec<(i64, String)>>,
        pub failures: HashMap<i64, i64>,
        pub updates: Vec<Update>,
        pub webhook_urls: Mutex<Vec<String>>,
        pub fail_set_webhook: bool,
        /// Number of upcoming `get_updates` calls that fail.
        pub failing_polls: AtomicUsize,
        pub polled_offsets: Mutex<Vec<i64>>,
    }

    impl FakeTelegram {
        pub fn failing(failures: &[(i64, i64)]) -> Self {
            Self {
                failures: failures.iter().copied().collect(),
                ..Default::default()
            }
        }

        pub fn recipients(&self) -> HashSet<i64> {
            self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
        }
    }

    #[async_trait]
    impl TelegramApi for FakeTelegram {
        async fn send_message(
            &self,
            chat_id: i64,
            text: &str,
            _parse_mode: Option<ParseMode>,
        ) -> Result<(), SenderError> {
            if let Some(code) = self.failures.get(&chat_id) {
                return Err(SenderError::Api {
                    error_code: *code,
                    description: "fake failure".to_string(),
                });
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }

        async fn set_webhook(&self, url: &str) -> Result<serde_json::Value, SenderError> {
            self.webhook_urls.lock().unwrap().push(url.to_string());
            if self.fail_set_webhook {
                return Err(SenderError::InvalidResponse("connection reset by peer".to_string()));
            }
            Ok(serde_json::json!({ "ok": true, "result": true, "description": "Webhook was set" }))
        }

        async fn get_webhook_info(&self) -> Result<WebhookInfo, SenderError> {
            Ok(WebhookInfo::default())
        }

        async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, SenderError> {
            self.polled_offsets.lock().unwrap().push(offset);
            if self
                .failing_polls
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SenderError::Api {
                    error_code: 502,
                    description: "Bad Gateway".to_string(),
                });
            }
            Ok(self
                .updates
                .iter()
                .filter(|u| u.update_id >= offset)
                .cloned()
                .collect())
        }
    }

    pub(crate) fn start_update(update_id: i64, chat_id: i64, text: &str) -> Update {
        Update {
            update_id,
            message: Some(IncomingMessage {
                chat: Chat { id: chat_id },
                text: Some(text.to_string()),
            }),
        }
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Иван".to_string(),
            email: "ivan@example.com".to_string(),
            phone: None,
            message: "Нужна реклама!".to_string(),
        }
    }

    #[test]
    fn contact_message_escapes_and_skips_missing_phone() {
        let now = Local.with_ymd_and_hms(2026, 3, 5, 14, 7, 9).single().unwrap();
        let text = NotificationService::format_contact_message(&submission(), &now);

        assert!(text.starts_with("📋 *Новая заявка с сайта Windexs Реклама*"));
        assert!(text.contains("📧 *Email:* ivan@example\\.com\n"));
        assert!(text.contains("Нужна реклама\\!"));
        assert!(!text.contains("Телефон"));
        assert!(text.ends_with("⏰ *Время:* 05\\.03\\.2026, 14:07:09"));

        let with_phone = ContactSubmission {
            phone: Some("+7 900 000-00-00".to_string()),
            ..submission()
        };
        let text = NotificationService::format_contact_message(&with_phone, &now);
        assert!(text.contains("📱 *Телефон:* \\+7 900 000\\-00\\-00\n"));
    }

    #[tokio::test]
    async fn broadcast_reaches_every_chat_and_prunes_blocked_ones() {
        let registry = ChatRegistry::new();
        for id in [1, 2, 3] {
            registry.register(id);
        }
        let api = Arc::new(FakeTelegram::failing(&[(2, 403), (3, 400)]));
        let service = NotificationService::new(registry.clone(), api.clone());

        let report = service.broadcast_contact(&submission()).await;
        assert_eq!(report, BroadcastReport { sent: 1, errors: 2 });

        // Blocked chat is gone, the merely failing one stays.
        assert_eq!(registry.snapshot(), vec![1, 3]);

        let report = service.broadcast_contact(&submission()).await;
        assert_eq!(report, BroadcastReport { sent: 1, errors: 1 });
        assert_eq!(api.recipients(), HashSet::from([1]));
    }

    #[tokio::test]
    async fn broadcast_with_no_chats_sends_nothing() {
        let api = Arc::new(FakeTelegram::default());
        let service = NotificationService::new(ChatRegistry::new(), api.clone());
        let report = service.broadcast_contact(&submission()).await;
        assert_eq!(report, BroadcastReport::default());
        assert!(api.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_registers_and_greets() {
        let api = Arc::new(FakeTelegram::default());
        let service = NotificationService::new(ChatRegistry::new(), api.clone());

        assert_eq!(service.handle_update(&start_update(1, 77, "/start")).await, Some(77));
        assert!(service.registry().contains(77));
        assert_eq!(api.sent.lock().unwrap()[0].0, 77);

        assert_eq!(service.handle_update(&start_update(2, 78, "hello")).await, None);
        assert!(!service.registry().contains(78));

        let no_message = Update { update_id: 3, message: None };
        assert_eq!(service.handle_update(&no_message).await, None);
    }

    #[tokio::test]
    async fn failed_greeting_keeps_registration() {
        let api = Arc::new(FakeTelegram::failing(&[(55, 403)]));
        let service = NotificationService::new(ChatRegistry::new(), api);

        assert_eq!(service.handle_update(&start_update(1, 55, "/start")).await, Some(55));
        assert!(service.registry().contains(55));
    }

    #[tokio::test]
    async fn poll_once_advances_offset() {
        let api = Arc::new(FakeTelegram {
            updates: vec![
                start_update(40, 9, "/start"),
                start_update(41, 10, "what is this"),
                start_update(42, 11, "/start@windexs_bot"),
            ],
            ..Default::default()
        });
        let service = NotificationService::new(ChatRegistry::new(), api);

        let outcome = service.poll_once(0).await.unwrap();
        assert_eq!(outcome.next_offset, 43);
        assert_eq!(outcome.registered, vec![9, 11]);

        let outcome = service.poll_once(43).await.unwrap();
        assert_eq!(outcome, PollOutcome { next_offset: 43, registered: vec![] });
    }

    #[tokio::test]
    async fn failed_poll_reports_error_and_registers_nothing() {
        let api = Arc::new(FakeTelegram {
            updates: vec![start_update(1, 12, "/start")],
            failing_polls: AtomicUsize::new(1),
            ..Default::default()
        });
        let service = NotificationService::new(ChatRegistry::new(), api);

        let err = service.poll_once(0).await.unwrap_err();
        assert!(matches!(err, SenderError::Api { error_code: 502, .. }));
        assert!(service.registry().is_empty());

        let outcome = service.poll_once(0).await.unwrap();
        assert_eq!(outcome.registered, vec![12]);
    }

    #[test]
    fn start_command_variants() {
        assert!(is_start_command("/start"));
        assert!(is_start_command(" /start "));
        assert!(is_start_command("/start@windexs_bot"));
        assert!(is_start_command("/start promo"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("/start@"));
        assert!(!is_start_command("/start@ promo"));
        assert!(!is_start_command("start"));
        assert!(!is_start_command(""));
    }
}
