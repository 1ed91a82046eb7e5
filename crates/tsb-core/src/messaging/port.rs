use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{MessagingCapabilities, OutboundReply},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation; the shape is kept narrow so future
/// adapters (Slack/Discord) can fit behind the same interface with capability
/// flags.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Send a composed reply (text, or media caption re-attaching the
    /// inbound asset).
    async fn send_reply(&self, chat_id: ChatId, reply: OutboundReply) -> Result<MessageRef>;
}
