use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use tracing::warn;

use tsb_core::{
    audit::AuditEvent,
    domain::{ChatId, MediaAsset, UserId},
    messaging::types::{InboundMessage, MediaKind},
};

use crate::router::AppState;

/// Classify the inbound message's media kind and pick up its caption-or-text.
///
/// Exactly one kind applies; the asset reference is the Telegram file id,
/// re-attached verbatim when the reply goes out.
fn classify(msg: &Message) -> (MediaKind, String) {
    let text = msg
        .text()
        .or_else(|| msg.caption())
        .unwrap_or("")
        .to_string();

    if let Some(photos) = msg.photo() {
        if let Some(best) = photos.last() {
            return (MediaKind::Photo(MediaAsset(best.file.id.clone())), text);
        }
    }
    if let Some(video) = msg.video() {
        return (MediaKind::Video(MediaAsset(video.file.id.clone())), text);
    }
    if let Some(doc) = msg.document() {
        return (MediaKind::Document(MediaAsset(doc.file.id.clone())), text);
    }

    (MediaKind::Text, text)
}

pub async fn handle_convert(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let (media, text) = classify(&msg);
    // Stickers, voice notes and the like carry neither text nor a
    // convertible asset; there is nothing to answer.
    if text.is_empty() && matches!(media, MediaKind::Text) {
        return Ok(());
    }

    let inbound = InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(user.id.0 as i64),
        display_name: Some(user.first_name.clone()),
        text,
        media,
    };

    match state.pipeline.handle(&inbound, state.messenger.as_ref()).await {
        Ok(report) if report.links_found > 0 => {
            let event = AuditEvent::convert(
                inbound.user_id.0,
                inbound.display_name.as_deref(),
                report.links_found,
                report.links_shortened,
            );
            if let Err(e) = state.audit.write(event) {
                warn!(error = %e, "failed to write audit event");
            }
        }
        Ok(_) => {}
        Err(e) => {
            warn!(user_id = user.id.0, error = %e, "conversion pipeline failed");
        }
    }

    Ok(())
}
