//! Credential store abstractions and in-memory backend.
//!
//! The SQLite backend lives in the `tsb-store` adapter crate.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{domain::UserId, Result};

/// Async store contract for per-user accounts and shortener credentials.
///
/// `user_id` is a unique key in both tables; at most one credential exists
/// per user. Upserts are atomic per key ("last writer wins" on reconnect);
/// no operation holds a lock across a network call.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create or refresh the account row. Idempotent; callers treat failures
    /// as non-fatal bookkeeping (log and continue).
    async fn upsert_account(&self, user_id: UserId, display_name: Option<&str>) -> Result<()>;

    /// Current credential for the user. Absence is not an error.
    async fn get_credential(&self, user_id: UserId) -> Result<Option<String>>;

    /// Store the credential, replacing any prior one for this user.
    async fn set_credential(&self, user_id: UserId, api_key: &str) -> Result<()>;

    /// Remove the credential. Returns whether one existed, so callers can
    /// distinguish "disconnected" from "was never connected".
    async fn delete_credential(&self, user_id: UserId) -> Result<bool>;

    /// Every known account, for admin broadcasts.
    async fn list_all_users(&self) -> Result<Vec<UserId>>;

    /// Only accounts with a stored credential.
    async fn list_credentialed_users(&self) -> Result<Vec<UserId>>;
}

/// In-memory implementation for tests and local experimentation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    accounts: HashMap<i64, Option<String>>,
    credentials: HashMap<i64, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn upsert_account(&self, user_id: UserId, display_name: Option<&str>) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .accounts
            .insert(user_id.0, display_name.map(|s| s.to_string()));
        Ok(())
    }

    async fn get_credential(&self, user_id: UserId) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner.credentials.get(&user_id.0).cloned())
    }

    async fn set_credential(&self, user_id: UserId, api_key: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.credentials.insert(user_id.0, api_key.to_string());
        Ok(())
    }

    async fn delete_credential(&self, user_id: UserId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.credentials.remove(&user_id.0).is_some())
    }

    async fn list_all_users(&self) -> Result<Vec<UserId>> {
        let inner = self.inner.read().await;
        let mut ids: Vec<i64> = inner.accounts.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids.into_iter().map(UserId).collect())
    }

    async fn list_credentialed_users(&self) -> Result<Vec<UserId>> {
        let inner = self.inner.read().await;
        let mut ids: Vec<i64> = inner.credentials.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids.into_iter().map(UserId).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_credential_is_idempotent_and_overwrites() {
        let store = MemoryStore::new();
        let u = UserId(7);

        store.set_credential(u, "key-a").await.unwrap();
        store.set_credential(u, "key-a").await.unwrap();
        assert_eq!(store.get_credential(u).await.unwrap().as_deref(), Some("key-a"));

        store.set_credential(u, "key-b").await.unwrap();
        assert_eq!(store.get_credential(u).await.unwrap().as_deref(), Some("key-b"));
    }

    #[tokio::test]
    async fn delete_credential_reports_prior_existence() {
        let store = MemoryStore::new();
        let u = UserId(1);

        assert!(!store.delete_credential(u).await.unwrap());

        store.set_credential(u, "key").await.unwrap();
        assert!(store.delete_credential(u).await.unwrap());
        assert_eq!(store.get_credential(u).await.unwrap(), None);
        assert!(!store.delete_credential(u).await.unwrap());
    }

    #[tokio::test]
    async fn user_lists_are_independent() {
        let store = MemoryStore::new();
        store.upsert_account(UserId(1), Some("a")).await.unwrap();
        store.upsert_account(UserId(2), None).await.unwrap();
        store.upsert_account(UserId(3), Some("c")).await.unwrap();
        store.set_credential(UserId(2), "key").await.unwrap();

        let all = store.list_all_users().await.unwrap();
        assert_eq!(all, vec![UserId(1), UserId(2), UserId(3)]);

        let credentialed = store.list_credentialed_users().await.unwrap();
        assert_eq!(credentialed, vec![UserId(2)]);
    }

    #[tokio::test]
    async fn upsert_account_refreshes_display_name() {
        let store = MemoryStore::new();
        let u = UserId(42);
        store.upsert_account(u, Some("old")).await.unwrap();
        store.upsert_account(u, Some("new")).await.unwrap();

        let inner = store.inner.read().await;
        assert_eq!(inner.accounts.get(&42).unwrap().as_deref(), Some("new"));
        assert_eq!(inner.accounts.len(), 1);
    }
}
