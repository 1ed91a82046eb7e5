use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tracing::info;

use tsb_core::messaging::throttled::{ThrottleConfig, ThrottledMessenger};
use tsb_core::{
    audit::AuditLogger, broadcast::BroadcastDispatcher, config::Config,
    messaging::port::MessagingPort, pipeline::LinkConversionPipeline, shorten::ShortenerClient,
    store::CredentialStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<dyn CredentialStore>,
    pub shortener: Arc<dyn ShortenerClient>,
    pub messenger: Arc<dyn MessagingPort>,
    pub pipeline: Arc<LinkConversionPipeline>,
    pub broadcaster: Arc<BroadcastDispatcher>,
    pub audit: Arc<AuditLogger>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<dyn CredentialStore>,
    shortener: Arc<dyn ShortenerClient>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        info!(username = me.username(), "terashort started");
    }
    info!(db = %cfg.database_path.display(), admin = cfg.admin_user_id, "configuration loaded");

    // Wrap the raw Telegram messenger with a pacing decorator so broadcast
    // sweeps stay under flood limits. The adapter still retries a single
    // RetryAfter per call.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig {
            global_min_interval: cfg.send_global_min_interval,
            per_chat_min_interval: cfg.send_per_chat_min_interval,
        },
    ));

    let pipeline = Arc::new(LinkConversionPipeline::new(
        store.clone(),
        shortener.clone(),
        cfg.redirect_base_url.clone(),
    ));
    let broadcaster = Arc::new(BroadcastDispatcher::new(store.clone(), cfg.admin_user_id));
    let audit = Arc::new(AuditLogger::new(
        cfg.audit_log_path.clone(),
        cfg.audit_log_json,
    ));

    let state = Arc::new(AppState {
        cfg,
        store,
        shortener,
        messenger,
        pipeline,
        broadcaster,
        audit,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
