//! Outbound pacing for the chat transport.
//!
//! A full report can be several segments sent back to back, and Telegram
//! answers bursts to one chat with 429s. Sends are delayed, never retried.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{port::MessagingPort, types::MessagingCapabilities},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between any two sends (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between sends to the same chat.
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

/// Next free send slot, overall and per chat. Slots are handed out in
/// arrival order from a single table, so a booking never races another.
#[derive(Debug)]
struct SendSlots {
    cfg: ThrottleConfig,
    global_next: Option<Instant>,
    chat_next: HashMap<ChatId, Instant>,
}

impl SendSlots {
    fn new(cfg: ThrottleConfig) -> Self {
        Self {
            cfg,
            global_next: None,
            chat_next: HashMap::new(),
        }
    }

    /// Book the earliest slot for `chat` at or after `now` and return how long
    /// the caller has to wait for it.
    fn reserve(&mut self, chat: ChatId, now: Instant) -> Duration {
        let mut start = now;
        if let Some(next) = self.global_next {
            start = start.max(next);
        }
        if let Some(next) = self.chat_next.get(&chat) {
            start = start.max(*next);
        }

        self.global_next = Some(start + self.cfg.global_min_interval);
        self.chat_next.insert(chat, start + self.cfg.per_chat_min_interval);
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that paces outbound sends.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    slots: Mutex<SendSlots>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            slots: Mutex::new(SendSlots::new(cfg)),
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let wait = self.slots.lock().await.reserve(chat_id, Instant::now());
        if !wait.is_zero() {
            tracing::debug!(
                chat_id = chat_id.0,
                wait_ms = wait.as_millis() as u64,
                "pacing outbound message"
            );
            sleep(wait).await;
        }
        self.inner.send_html(chat_id, html).await
    }
}
