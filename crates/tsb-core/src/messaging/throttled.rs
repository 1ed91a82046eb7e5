use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, OutboundReply},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* outbound API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat (Telegram 1 msg/sec style limits).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that paces outbound calls.
///
/// Broadcast fan-out can touch hundreds of chats in one sweep; this keeps the
/// sweep under Telegram's flood limits. It does not guarantee zero 429s (the
/// adapter still retries `RetryAfter` once), but it should drastically reduce
/// them.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_chat(&self, chat_id: i64) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = if global_wait > chat_wait {
            global_wait
        } else {
            chat_wait
        };
        if wait > Duration::from_millis(0) {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn send_reply(&self, chat_id: ChatId, reply: OutboundReply) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_reply(chat_id, reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMessenger {
        sent: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MessagingPort for CountingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_html: true,
                supports_media_captions: true,
                max_message_len: 4096,
            }
        }

        async fn send_html(&self, chat_id: ChatId, _html: &str) -> Result<MessageRef> {
            let n = self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(n as i32),
            })
        }

        async fn send_reply(&self, chat_id: ChatId, _reply: OutboundReply) -> Result<MessageRef> {
            self.send_html(chat_id, "").await
        }
    }

    #[tokio::test]
    async fn forwards_inner_results() {
        let inner = Arc::new(CountingMessenger {
            sent: AtomicUsize::new(0),
        });
        let throttled = ThrottledMessenger::new(
            inner.clone(),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_chat_min_interval: Duration::from_millis(0),
            },
        );

        let r1 = throttled.send_html(ChatId(1), "a").await.unwrap();
        let r2 = throttled.send_html(ChatId(1), "b").await.unwrap();
        assert_eq!(r1.message_id, MessageId(0));
        assert_eq!(r2.message_id, MessageId(1));
        assert_eq!(inner.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn paces_consecutive_sends_to_one_chat() {
        let inner = Arc::new(CountingMessenger {
            sent: AtomicUsize::new(0),
        });
        let throttled = ThrottledMessenger::new(
            inner,
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_chat_min_interval: Duration::from_millis(50),
            },
        );

        let start = Instant::now();
        throttled.send_html(ChatId(9), "a").await.unwrap();
        throttled.send_html(ChatId(9), "b").await.unwrap();
        throttled.send_html(ChatId(9), "c").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
