use crate::domain::{ChatId, MediaAsset, UserId};

/// What kind of message arrived, and which asset it carried.
///
/// Exactly one media kind per inbound message; transport-specific detail
/// (file sizes, thumbnails) stays in the Telegram adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Text,
    Photo(MediaAsset),
    Video(MediaAsset),
    Document(MediaAsset),
}

/// Cross-messenger inbound message model for link conversion.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub display_name: Option<String>,
    /// Caption for media messages, text otherwise.
    pub text: String,
    pub media: MediaKind,
}

/// Outbound reply, shaped to match the inbound message's media kind.
///
/// Media replies re-attach the *inbound* asset reference; the bot never
/// transcodes or re-hosts anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundReply {
    Text(String),
    Photo { asset: MediaAsset, caption: String },
    Video { asset: MediaAsset, caption: String },
    Document { asset: MediaAsset, caption: String },
}

impl OutboundReply {
    /// The human-visible text, whichever shape carries it.
    pub fn text(&self) -> &str {
        match self {
            OutboundReply::Text(t) => t,
            OutboundReply::Photo { caption, .. }
            | OutboundReply::Video { caption, .. }
            | OutboundReply::Document { caption, .. } => caption,
        }
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    pub supports_media_captions: bool,
    pub max_message_len: usize,
}
