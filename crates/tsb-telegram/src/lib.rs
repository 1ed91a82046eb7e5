//! Telegram adapter (teloxide).
//!
//! This crate implements the `tsb-core` MessagingPort over the Telegram Bot
//! API and hosts the update router + handlers.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use tsb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, OutboundReply},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_html: true,
            supports_media_captions: true,
            max_message_len: 4096,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_reply(&self, chat_id: ChatId, reply: OutboundReply) -> Result<MessageRef> {
        let msg = match &reply {
            OutboundReply::Text(text) => {
                return self.send_html(chat_id, text).await;
            }
            OutboundReply::Photo { asset, caption } => {
                self.with_retry(|| {
                    self.bot
                        .send_photo(Self::tg_chat(chat_id), InputFile::file_id(asset.0.clone()))
                        .caption(caption.clone())
                        .parse_mode(ParseMode::Html)
                })
                .await?
            }
            OutboundReply::Video { asset, caption } => {
                self.with_retry(|| {
                    self.bot
                        .send_video(Self::tg_chat(chat_id), InputFile::file_id(asset.0.clone()))
                        .caption(caption.clone())
                        .parse_mode(ParseMode::Html)
                })
                .await?
            }
            OutboundReply::Document { asset, caption } => {
                self.with_retry(|| {
                    self.bot
                        .send_document(Self::tg_chat(chat_id), InputFile::file_id(asset.0.clone()))
                        .caption(caption.clone())
                        .parse_mode(ParseMode::Html)
                })
                .await?
            }
        };

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}
