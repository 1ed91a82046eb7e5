//! Reply composition and canned user-facing texts.
//!
//! All strings here are Telegram HTML; interpolated user data goes through
//! `escape_html` at the call site that builds the string.

use crate::formatting::escape_html;
use crate::messaging::types::{MediaKind, OutboundReply};

/// Guidance sent when a message carries no qualifying share-link, or when
/// every shorten attempt failed.
pub const NO_VALID_LINK: &str = "Please send a valid Terabox link.";

pub const CONNECT_USAGE: &str =
    "Please provide your API key. Example: /connect YOUR_API_KEY";
pub const CONNECT_OK: &str =
    "✅ API key connected successfully! Send a Terabox link for converting.";
pub const CONNECT_INVALID: &str = "❌ Invalid API key. Please try again.\n\nHow to connect: /help";

pub const DISCONNECT_OK: &str = "✅ Your API key has been disconnected successfully.";
pub const DISCONNECT_NONE: &str = "⚠️ You have not connected an API key yet.";

pub const VIEW_NONE: &str = "⚠️ No API key is connected. Use /connect to link one.";

/// Terminal reply for link messages from users without a credential.
pub const CONNECT_FIRST: &str =
    "⚠️ You have not connected an API key yet. Use /connect to link one.\n\nHow to connect: /help";

pub const NOT_AUTHORIZED: &str = "❌ You are not authorized to use this command.";
pub const BROADCAST_USAGE: &str = "Please provide a message. Example: /broadcast Hello everyone!";

/// Generic fallback when a credential read/write fails; credential state is
/// load-bearing, so the user must not be told the operation succeeded.
pub const GENERIC_ERROR: &str = "❌ An error occurred. Please try again later.";

pub const UNKNOWN_COMMAND: &str = "Unknown command. See /commands for the list.";

pub fn greeting_connected(display_name: &str) -> String {
    format!(
        "📮 Hello {},\nYou are now successfully connected to our Terabis platform.\n\n\
         Send a Terabox link for converting.",
        escape_html(display_name)
    )
}

pub fn greeting_new(display_name: &str) -> String {
    format!(
        "📮 Hello {},\n\n\
         🌟 I am a bot to convert your Terabox links into your own short links, \
         credited directly to your Bisgram.com account.\n\n\
         💠 You can find your API key on https://bisgram.com/member/tools/api\n\n\
         Connect it with /connect YOUR_API_KEY\n\n\
         ℹ️ Send me /help to get the guide.",
        escape_html(display_name)
    )
}

pub fn view_connected(api_key: &str) -> String {
    format!(
        "✅ Your connected API key: <code>{}</code>",
        escape_html(api_key)
    )
}

pub fn help_text() -> String {
    "<b>How to connect:</b>\n\
     1. Go to Bisgram.com\n\
     2. Create an account\n\
     3. Open the menu bar (top left side)\n\
     4. Click on <b>Tools &gt; Developer API</b>\n\
     5. Copy the API token\n\
     6. Use this command: /connect YOUR_API_KEY\n\
     Example: /connect 8268d7f25na2c690bk25d4k20fbc63p5p09d6906"
        .to_string()
}

pub fn commands_text() -> String {
    "🤖 <b>Link shortener bot commands:</b>\n\
     /connect [API_KEY] - Connect your API key.\n\
     /disconnect - Disconnect your API key.\n\
     /view - View your connected API key.\n\
     /help - How to connect to the website."
        .to_string()
}

pub fn broadcast_done(delivered: usize, failed: usize) -> String {
    if failed == 0 {
        format!("✅ Broadcasted to {delivered} users.")
    } else {
        format!("✅ Broadcasted to {delivered} users ({failed} failed).")
    }
}

/// Build the outbound reply for one processed message.
///
/// Non-empty results become one numbered line per shortened link, attached to
/// the same media kind the inbound message carried. Empty results always fall
/// back to the plain-text guidance, never to media.
pub fn compose(media: &MediaKind, shortened: &[String]) -> OutboundReply {
    if shortened.is_empty() {
        return OutboundReply::Text(NO_VALID_LINK.to_string());
    }

    let caption = shortened
        .iter()
        .enumerate()
        .map(|(i, url)| format!("Link {}: {}", i + 1, escape_html(url)))
        .collect::<Vec<_>>()
        .join("\n");

    match media {
        MediaKind::Text => OutboundReply::Text(caption),
        MediaKind::Photo(asset) => OutboundReply::Photo {
            asset: asset.clone(),
            caption,
        },
        MediaKind::Video(asset) => OutboundReply::Video {
            asset: asset.clone(),
            caption,
        },
        MediaKind::Document(asset) => OutboundReply::Document {
            asset: asset.clone(),
            caption,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaAsset;

    #[test]
    fn empty_results_always_yield_text_guidance() {
        let media = MediaKind::Photo(MediaAsset("file-1".to_string()));
        let reply = compose(&media, &[]);
        assert_eq!(reply, OutboundReply::Text(NO_VALID_LINK.to_string()));
    }

    #[test]
    fn results_are_numbered_in_order() {
        let reply = compose(
            &MediaKind::Text,
            &["https://a.example/1".to_string(), "https://a.example/2".to_string()],
        );
        assert_eq!(
            reply.text(),
            "Link 1: https://a.example/1\nLink 2: https://a.example/2"
        );
    }

    #[test]
    fn media_replies_reattach_the_inbound_asset() {
        let asset = MediaAsset("vid-9".to_string());
        let reply = compose(
            &MediaKind::Video(asset.clone()),
            &["https://short.example/x".to_string()],
        );
        assert_eq!(
            reply,
            OutboundReply::Video {
                asset,
                caption: "Link 1: https://short.example/x".to_string(),
            }
        );
    }

    #[test]
    fn document_reply_keeps_document_kind() {
        let asset = MediaAsset("doc-3".to_string());
        let reply = compose(&MediaKind::Document(asset), &["u".to_string()]);
        assert!(matches!(reply, OutboundReply::Document { .. }));
    }
}
