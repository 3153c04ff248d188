use dashmap::DashSet;
use std::sync::Arc;

/// Telegram chats that asked for contact-form notifications with `/start`.
/// Held for the lifetime of the process only.
#[derive(Debug, Clone, Default)]
pub struct ChatRegistry {
    chats: Arc<DashSet<i64>>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the chat was not registered before.
    pub fn register(&self, chat_id: i64) -> bool {
        self.chats.insert(chat_id)
    }

    pub fn remove(&self, chat_id: i64) -> bool {
        self.chats.remove(&chat_id).is_some()
    }

    pub fn contains(&self, chat_id: i64) -> bool {
        self.chats.contains(&chat_id)
    }

    /// Sorted copy of the registered ids.
    pub fn snapshot(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.chats.iter().map(|id| *id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}
