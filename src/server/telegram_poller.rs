use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::notifications::NotificationService;

/// Pulls bot updates in-process so `/start` works without a public webhook.
/// Failed passes are logged and retried on the next tick with the same offset.
pub fn spawn(service: Arc<NotificationService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut offset = 0;
        info!(interval_seconds = every.as_secs(), "Telegram polling task started.");

        loop {
            ticker.tick().await;
            match service.poll_once(offset).await {
                Ok(outcome) => {
                    if !outcome.registered.is_empty() {
                        info!(
                            count = outcome.registered.len(),
                            total = service.registry().len(),
                            "Registered chats from polling."
                        );
                    } else {
                        debug!(offset = outcome.next_offset, "No new /start commands.");
                    }
                    offset = outcome.next_offset;
                }
                Err(e) => {
                    error!(error = %e, "Telegram polling failed.");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::ChatRegistry;
    use crate::notifications::service::tests::{FakeTelegram, start_update};
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn poller_registers_chats_from_updates() {
        let api = Arc::new(FakeTelegram {
            updates: vec![start_update(1, 501, "/start"), start_update(2, 502, "/start")],
            ..Default::default()
        });
        let registry = ChatRegistry::new();
        let service = Arc::new(NotificationService::new(registry.clone(), api));

        let handle = spawn(service, Duration::from_millis(10));
        for _ in 0..100 {
            if registry.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(registry.snapshot(), vec![501, 502]);
    }

    #[tokio::test]
    async fn poller_survives_errors_and_retries_same_offset() {
        let api = Arc::new(FakeTelegram {
            updates: vec![start_update(5, 600, "/start")],
            failing_polls: AtomicUsize::new(2),
            ..Default::default()
        });
        let registry = ChatRegistry::new();
        let service = Arc::new(NotificationService::new(registry.clone(), api.clone()));

        let handle = spawn(service, Duration::from_millis(10));
        for _ in 0..200 {
            if api.polled_offsets.lock().unwrap().len() >= 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        let offsets = api.polled_offsets.lock().unwrap().clone();
        assert!(offsets.len() >= 4, "poller stopped after {offsets:?}");
        // Two failed passes keep offset 0, the third succeeds and moves past update 5.
        assert_eq!(offsets[..4], [0, 0, 0, 6]);
        assert_eq!(registry.snapshot(), vec![600]);
    }
}
