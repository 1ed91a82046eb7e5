//! Per-message conversion orchestration.
//!
//! One inbound message flows credential lookup → link canonicalization →
//! sequential shortening → reply composition. The pipeline owns no state
//! across messages; everything shared lives behind the store port.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    messaging::{port::MessagingPort, types::InboundMessage},
    links, replies,
    shorten::ShortenerClient,
    store::CredentialStore,
    Result,
};

/// What one pipeline run did, for audit bookkeeping at the call site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub links_found: usize,
    pub links_shortened: usize,
}

pub struct LinkConversionPipeline {
    store: Arc<dyn CredentialStore>,
    shortener: Arc<dyn ShortenerClient>,
    redirect_base: String,
}

impl LinkConversionPipeline {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        shortener: Arc<dyn ShortenerClient>,
        redirect_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            shortener,
            redirect_base: redirect_base.into(),
        }
    }

    /// Process one inbound message end to end and send the reply.
    ///
    /// The credential gate comes first: an unconnected user gets the terminal
    /// "please connect" reply and no link is ever extracted or shortened.
    /// Individual shorten failures drop the affected link and keep going;
    /// only the credential lookup itself failing aborts with a generic error
    /// reply, since credential state is load-bearing.
    pub async fn handle(
        &self,
        msg: &InboundMessage,
        messenger: &dyn MessagingPort,
    ) -> Result<ConversionReport> {
        let api_key = match self.store.get_credential(msg.user_id).await {
            Ok(Some(key)) => key,
            Ok(None) => {
                messenger
                    .send_html(msg.chat_id, replies::CONNECT_FIRST)
                    .await?;
                return Ok(ConversionReport::default());
            }
            Err(e) => {
                warn!(user_id = msg.user_id.0, error = %e, "credential lookup failed");
                messenger.send_html(msg.chat_id, replies::GENERIC_ERROR).await?;
                return Ok(ConversionReport::default());
            }
        };

        let links = links::extract_and_canonicalize(&msg.text, &self.redirect_base);
        if links.is_empty() {
            messenger
                .send_html(msg.chat_id, replies::NO_VALID_LINK)
                .await?;
            return Ok(ConversionReport::default());
        }

        // Sequential, order preserving; a failed link is dropped from the
        // result set and the remaining links still get their round trip.
        let mut shortened = Vec::with_capacity(links.len());
        for link in &links {
            match self.shortener.shorten(&api_key, &link.canonical).await {
                Ok(url) => shortened.push(url),
                Err(e) => {
                    warn!(raw = %link.raw, error = %e, "shorten failed, dropping link");
                }
            }
        }
        debug!(
            user_id = msg.user_id.0,
            found = links.len(),
            shortened = shortened.len(),
            "conversion finished"
        );

        let reply = replies::compose(&msg.media, &shortened);
        messenger.send_reply(msg.chat_id, reply).await?;
        Ok(ConversionReport {
            links_found: links.len(),
            links_shortened: shortened.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MediaAsset, MessageId, MessageRef, UserId};
    use crate::messaging::types::{MediaKind, MessagingCapabilities, OutboundReply};
    use crate::shorten::ShortenError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Shortener fake: succeeds unless the canonical URL contains "fail",
    /// counting every call.
    struct ScriptedShortener {
        calls: AtomicUsize,
    }

    impl ScriptedShortener {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ShortenerClient for ScriptedShortener {
        async fn shorten(
            &self,
            _api_key: &str,
            canonical_url: &str,
        ) -> std::result::Result<String, ShortenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if canonical_url.contains("fail") {
                return Err(ShortenError("scripted failure".to_string()));
            }
            Ok(format!("https://short.example/{}", canonical_url.len()))
        }

        async fn validate_credential(&self, _api_key: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<(ChatId, OutboundReply)>>,
    }

    impl RecordingMessenger {
        async fn replies(&self) -> Vec<(ChatId, OutboundReply)> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_html: true,
                supports_media_captions: true,
                max_message_len: 4096,
            }
        }

        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            self.send_reply(chat_id, OutboundReply::Text(html.to_string()))
                .await
        }

        async fn send_reply(&self, chat_id: ChatId, reply: OutboundReply) -> Result<MessageRef> {
            let mut sent = self.sent.lock().await;
            sent.push((chat_id, reply));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(sent.len() as i32),
            })
        }
    }

    const BASE: &str = "https://redirect.example/?url=";

    fn text_message(user: i64, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(user),
            user_id: UserId(user),
            display_name: Some("tester".to_string()),
            text: text.to_string(),
            media: MediaKind::Text,
        }
    }

    fn pipeline(store: Arc<MemoryStore>, shortener: Arc<ScriptedShortener>) -> LinkConversionPipeline {
        LinkConversionPipeline::new(store, shortener, BASE)
    }

    #[tokio::test]
    async fn unconnected_user_never_triggers_a_shorten_call() {
        let store = Arc::new(MemoryStore::new());
        let shortener = Arc::new(ScriptedShortener::new());
        let messenger = RecordingMessenger::default();

        let msg = text_message(1, "https://example.com/s/abc123");
        pipeline(store, shortener.clone())
            .handle(&msg, &messenger)
            .await
            .unwrap();

        assert_eq!(shortener.calls.load(Ordering::SeqCst), 0);
        let sent = messenger.replies().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.text(), replies::CONNECT_FIRST);
    }

    #[tokio::test]
    async fn message_without_links_gets_guidance() {
        let store = Arc::new(MemoryStore::new());
        store.set_credential(UserId(2), "key").await.unwrap();
        let shortener = Arc::new(ScriptedShortener::new());
        let messenger = RecordingMessenger::default();

        let msg = text_message(2, "hello, no links here");
        pipeline(store, shortener.clone())
            .handle(&msg, &messenger)
            .await
            .unwrap();

        assert_eq!(shortener.calls.load(Ordering::SeqCst), 0);
        let sent = messenger.replies().await;
        assert_eq!(sent[0].1.text(), replies::NO_VALID_LINK);
    }

    #[tokio::test]
    async fn partial_shorten_failure_keeps_the_surviving_link() {
        let store = Arc::new(MemoryStore::new());
        store.set_credential(UserId(3), "key").await.unwrap();
        let shortener = Arc::new(ScriptedShortener::new());
        let messenger = RecordingMessenger::default();

        let msg = text_message(
            3,
            "https://a.example/s/ok-one and https://b.example/s/fail-two",
        );
        let report = pipeline(store, shortener.clone())
            .handle(&msg, &messenger)
            .await
            .unwrap();
        assert_eq!(
            report,
            ConversionReport {
                links_found: 2,
                links_shortened: 1
            }
        );

        // Both links got their round trip; only one survived.
        assert_eq!(shortener.calls.load(Ordering::SeqCst), 2);
        let sent = messenger.replies().await;
        assert_eq!(sent.len(), 1);
        let text = sent[0].1.text();
        assert!(text.starts_with("Link 1: "));
        assert!(!text.contains("Link 2"));
    }

    #[tokio::test]
    async fn all_links_failing_falls_back_to_guidance() {
        let store = Arc::new(MemoryStore::new());
        store.set_credential(UserId(4), "key").await.unwrap();
        let shortener = Arc::new(ScriptedShortener::new());
        let messenger = RecordingMessenger::default();

        let msg = text_message(4, "https://a.example/s/fail-only");
        pipeline(store, shortener)
            .handle(&msg, &messenger)
            .await
            .unwrap();

        let sent = messenger.replies().await;
        assert_eq!(sent[0].1, OutboundReply::Text(replies::NO_VALID_LINK.to_string()));
    }

    #[tokio::test]
    async fn photo_message_gets_photo_reply_with_original_asset() {
        let store = Arc::new(MemoryStore::new());
        store.set_credential(UserId(5), "key").await.unwrap();
        let shortener = Arc::new(ScriptedShortener::new());
        let messenger = RecordingMessenger::default();

        let msg = InboundMessage {
            chat_id: ChatId(5),
            user_id: UserId(5),
            display_name: None,
            text: "https://a.example/s/abc".to_string(),
            media: MediaKind::Photo(MediaAsset("photo-file-id".to_string())),
        };
        pipeline(store, shortener)
            .handle(&msg, &messenger)
            .await
            .unwrap();

        let sent = messenger.replies().await;
        match &sent[0].1 {
            OutboundReply::Photo { asset, caption } => {
                assert_eq!(asset.0, "photo-file-id");
                assert!(caption.starts_with("Link 1: "));
            }
            other => panic!("expected photo reply, got {other:?}"),
        }
    }
}
