/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Opaque reference to a media asset already hosted by the transport
/// (a Telegram file id). The bot never downloads or re-hosts media; it only
/// re-attaches this reference when replying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaAsset(pub String);

/// One recognized share-link, before and after canonicalization.
///
/// Derived per message, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalLink {
    pub raw: String,
    pub canonical: String,
}
