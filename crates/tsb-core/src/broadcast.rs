//! Admin broadcast fan-out.
//!
//! One logical message goes to every member of the recipient set,
//! independently: a failed send is logged and skipped, never retried, and
//! never stops the sweep. Broadcasts are not idempotent, so there is no
//! whole-broadcast retry either.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    domain::{ChatId, UserId},
    formatting::escape_html,
    messaging::port::MessagingPort,
    store::CredentialStore,
    Result,
};

/// Which registry the fan-out walks. The two lists are independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastScope {
    AllUsers,
    CredentialedUsers,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Unauthorized,
    EmptyMessage,
    Completed { delivered: usize, failed: usize },
}

pub struct BroadcastDispatcher {
    store: Arc<dyn CredentialStore>,
    admin_user_id: i64,
}

impl BroadcastDispatcher {
    pub fn new(store: Arc<dyn CredentialStore>, admin_user_id: i64) -> Self {
        Self {
            store,
            admin_user_id,
        }
    }

    /// Fan `text` out to every recipient in `scope`.
    ///
    /// Authorization and the empty-body check happen before any send attempt;
    /// an unauthorized sender causes zero outbound messages.
    pub async fn broadcast(
        &self,
        sender: UserId,
        text: &str,
        scope: BroadcastScope,
        messenger: &dyn MessagingPort,
    ) -> Result<BroadcastOutcome> {
        if sender.0 != self.admin_user_id {
            return Ok(BroadcastOutcome::Unauthorized);
        }
        if text.trim().is_empty() {
            return Ok(BroadcastOutcome::EmptyMessage);
        }

        let recipients = match scope {
            BroadcastScope::AllUsers => self.store.list_all_users().await?,
            BroadcastScope::CredentialedUsers => self.store.list_credentialed_users().await?,
        };

        let html = escape_html(text);
        let mut delivered = 0usize;
        let mut failed = 0usize;
        for user in recipients {
            match messenger.send_html(ChatId(user.0), &html).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!(user_id = user.0, error = %e, "broadcast send failed");
                }
            }
        }

        info!(delivered, failed, ?scope, "broadcast sweep finished");
        Ok(BroadcastOutcome::Completed { delivered, failed })
    }
}
