//! Telegram update handlers.
//!
//! Commands route to `commands`; everything else (text or media with a
//! caption) goes through the link conversion pipeline in `convert`.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use tracing::warn;

use tsb_core::domain::UserId;

use crate::router::AppState;

mod commands;
mod convert;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = UserId(user.id.0 as i64);

    // Account bookkeeping is best-effort: a store hiccup must not block the
    // message itself.
    if let Err(e) = state
        .store
        .upsert_account(user_id, Some(user.first_name.as_str()))
        .await
    {
        warn!(user_id = user_id.0, error = %e, "account upsert failed");
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    convert::handle_convert(msg, state).await
}
