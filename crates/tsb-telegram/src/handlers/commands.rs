use std::sync::Arc;

use teloxide::prelude::*;

use tracing::warn;

use tsb_core::{
    audit::AuditEvent,
    broadcast::{BroadcastOutcome, BroadcastScope},
    domain::{ChatId, UserId},
    replies,
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user_id = UserId(user.id.0 as i64);
    let chat_id = ChatId(msg.chat.id.0);
    let display_name = user.first_name.clone();

    let (cmd, args) = parse_command(text);
    match cmd.as_str() {
        "start" => handle_start(&state, chat_id, user_id, &display_name).await,
        "connect" => handle_connect(&state, chat_id, user_id, &display_name, &args).await,
        "disconnect" => handle_disconnect(&state, chat_id, user_id, &display_name).await,
        "view" => handle_view(&state, chat_id, user_id).await,
        "help" => {
            let _ = state.messenger.send_html(chat_id, &replies::help_text()).await;
        }
        "commands" => {
            let _ = state
                .messenger
                .send_html(chat_id, &replies::commands_text())
                .await;
        }
        "broadcast" => {
            handle_broadcast(&state, chat_id, user_id, &display_name, &args, BroadcastScope::AllUsers)
                .await
        }
        "broadcast_credentialed" => {
            handle_broadcast(
                &state,
                chat_id,
                user_id,
                &display_name,
                &args,
                BroadcastScope::CredentialedUsers,
            )
            .await
        }
        _ => {
            let _ = state
                .messenger
                .send_html(chat_id, replies::UNKNOWN_COMMAND)
                .await;
        }
    }

    Ok(())
}

async fn handle_start(state: &AppState, chat_id: ChatId, user_id: UserId, display_name: &str) {
    // Greeting only; a failed lookup degrades to the "new user" text.
    let greeting = match state.store.get_credential(user_id).await {
        Ok(Some(_)) => replies::greeting_connected(display_name),
        Ok(None) => replies::greeting_new(display_name),
        Err(e) => {
            warn!(user_id = user_id.0, error = %e, "credential lookup failed on /start");
            replies::greeting_new(display_name)
        }
    };
    let _ = state.messenger.send_html(chat_id, &greeting).await;
}

async fn handle_connect(
    state: &AppState,
    chat_id: ChatId,
    user_id: UserId,
    display_name: &str,
    args: &str,
) {
    let api_key = args.split_whitespace().next().unwrap_or("");
    if api_key.is_empty() {
        let _ = state
            .messenger
            .send_html(chat_id, replies::CONNECT_USAGE)
            .await;
        return;
    }

    // Validation always precedes persistence; an unusable key is never
    // stored.
    if !state.shortener.validate_credential(api_key).await {
        audit(state, AuditEvent::connect(user_id.0, Some(display_name), false));
        let _ = state
            .messenger
            .send_html(chat_id, replies::CONNECT_INVALID)
            .await;
        return;
    }

    match state.store.set_credential(user_id, api_key).await {
        Ok(()) => {
            audit(state, AuditEvent::connect(user_id.0, Some(display_name), true));
            let _ = state.messenger.send_html(chat_id, replies::CONNECT_OK).await;
        }
        Err(e) => {
            warn!(user_id = user_id.0, error = %e, "failed to store credential");
            let _ = state
                .messenger
                .send_html(chat_id, replies::GENERIC_ERROR)
                .await;
        }
    }
}

async fn handle_disconnect(state: &AppState, chat_id: ChatId, user_id: UserId, display_name: &str) {
    match state.store.delete_credential(user_id).await {
        Ok(existed) => {
            audit(
                state,
                AuditEvent::disconnect(user_id.0, Some(display_name), existed),
            );
            let reply = if existed {
                replies::DISCONNECT_OK
            } else {
                replies::DISCONNECT_NONE
            };
            let _ = state.messenger.send_html(chat_id, reply).await;
        }
        Err(e) => {
            warn!(user_id = user_id.0, error = %e, "failed to delete credential");
            let _ = state
                .messenger
                .send_html(chat_id, replies::GENERIC_ERROR)
                .await;
        }
    }
}

async fn handle_view(state: &AppState, chat_id: ChatId, user_id: UserId) {
    match state.store.get_credential(user_id).await {
        Ok(Some(key)) => {
            let _ = state
                .messenger
                .send_html(chat_id, &replies::view_connected(&key))
                .await;
        }
        Ok(None) => {
            let _ = state.messenger.send_html(chat_id, replies::VIEW_NONE).await;
        }
        Err(e) => {
            warn!(user_id = user_id.0, error = %e, "failed to read credential");
            let _ = state
                .messenger
                .send_html(chat_id, replies::GENERIC_ERROR)
                .await;
        }
    }
}

async fn handle_broadcast(
    state: &AppState,
    chat_id: ChatId,
    user_id: UserId,
    display_name: &str,
    args: &str,
    scope: BroadcastScope,
) {
    let outcome = match state
        .broadcaster
        .broadcast(user_id, args, scope, state.messenger.as_ref())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(user_id = user_id.0, error = %e, "broadcast failed");
            let _ = state
                .messenger
                .send_html(chat_id, replies::GENERIC_ERROR)
                .await;
            return;
        }
    };

    match outcome {
        BroadcastOutcome::Unauthorized => {
            audit(
                state,
                AuditEvent::unauthorized(user_id.0, Some(display_name), args),
            );
            let _ = state
                .messenger
                .send_html(chat_id, replies::NOT_AUTHORIZED)
                .await;
        }
        BroadcastOutcome::EmptyMessage => {
            let _ = state
                .messenger
                .send_html(chat_id, replies::BROADCAST_USAGE)
                .await;
        }
        BroadcastOutcome::Completed { delivered, failed } => {
            audit(state, AuditEvent::broadcast(user_id.0, args, delivered, failed));
            let _ = state
                .messenger
                .send_html(chat_id, &replies::broadcast_done(delivered, failed))
                .await;
        }
    }
}

fn audit(state: &AppState, event: AuditEvent) {
    if let Err(e) = state.audit.write(event) {
        warn!(error = %e, "failed to write audit event");
    }
}

#[cfg(test)]
mod tests {
    use super::parse_command;

    #[test]
    fn parses_command_and_args() {
        assert_eq!(
            parse_command("/connect abc123"),
            ("connect".to_string(), "abc123".to_string())
        );
        assert_eq!(parse_command("/view"), ("view".to_string(), String::new()));
    }

    #[test]
    fn strips_botname_suffix() {
        assert_eq!(
            parse_command("/broadcast@terashort_bot hello all"),
            ("broadcast".to_string(), "hello all".to_string())
        );
    }

    #[test]
    fn lowercases_the_command() {
        assert_eq!(
            parse_command("/Connect KEY"),
            ("connect".to_string(), "KEY".to_string())
        );
    }
}
