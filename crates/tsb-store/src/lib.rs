//! SQLite-backed `CredentialStore` implementation with durable persistence.
//!
//! Two keyed tables, both unique on `user_id`: `accounts` (display metadata)
//! and `credentials` (the user's shortener API key). Upserts are atomic per
//! key; SQLite's own row-level update supplies the only consistency guarantee
//! the bot needs ("last writer wins" on reconnect).

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use tsb_core::{domain::UserId, errors::Error, store::CredentialStore, Result};

#[derive(Debug)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Creates a SQLite-backed store at `path`, creating schema if needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { db_path };
        let connection = store.open_connection()?;
        store.initialize_schema(&connection)?;
        Ok(store)
    }

    fn open_connection(&self) -> Result<Connection> {
        let connection = Connection::open(&self.db_path).map_err(map_err)?;
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(map_err)?;
        connection
            .execute_batch(
                r#"
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                "#,
            )
            .map_err(map_err)?;
        Ok(connection)
    }

    fn initialize_schema(&self, connection: &Connection) -> Result<()> {
        connection
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS accounts (
                    user_id INTEGER PRIMARY KEY,
                    display_name TEXT NULL
                );

                CREATE TABLE IF NOT EXISTS credentials (
                    user_id INTEGER PRIMARY KEY,
                    api_key TEXT NOT NULL
                );
                "#,
            )
            .map_err(map_err)?;
        Ok(())
    }
}

fn map_err(e: rusqlite::Error) -> Error {
    Error::Store(format!("sqlite error: {e}"))
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn upsert_account(&self, user_id: UserId, display_name: Option<&str>) -> Result<()> {
        let connection = self.open_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO accounts (user_id, display_name) VALUES (?1, ?2)
                ON CONFLICT(user_id) DO UPDATE SET display_name = excluded.display_name
                "#,
                params![user_id.0, display_name],
            )
            .map_err(map_err)?;
        Ok(())
    }

    async fn get_credential(&self, user_id: UserId) -> Result<Option<String>> {
        let connection = self.open_connection()?;
        connection
            .query_row(
                "SELECT api_key FROM credentials WHERE user_id = ?1",
                params![user_id.0],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(map_err)
    }

    async fn set_credential(&self, user_id: UserId, api_key: &str) -> Result<()> {
        let connection = self.open_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO credentials (user_id, api_key) VALUES (?1, ?2)
                ON CONFLICT(user_id) DO UPDATE SET api_key = excluded.api_key
                "#,
                params![user_id.0, api_key],
            )
            .map_err(map_err)?;
        Ok(())
    }

    async fn delete_credential(&self, user_id: UserId) -> Result<bool> {
        let connection = self.open_connection()?;
        let deleted = connection
            .execute(
                "DELETE FROM credentials WHERE user_id = ?1",
                params![user_id.0],
            )
            .map_err(map_err)?;
        Ok(deleted > 0)
    }

    async fn list_all_users(&self) -> Result<Vec<UserId>> {
        let connection = self.open_connection()?;
        let mut stmt = connection
            .prepare("SELECT user_id FROM accounts ORDER BY user_id")
            .map_err(map_err)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(map_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_err)?;
        Ok(ids.into_iter().map(UserId).collect())
    }

    async fn list_credentialed_users(&self) -> Result<Vec<UserId>> {
        let connection = self.open_connection()?;
        let mut stmt = connection
            .prepare("SELECT user_id FROM credentials ORDER BY user_id")
            .map_err(map_err)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(map_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_err)?;
        Ok(ids.into_iter().map(UserId).collect())
    }
}
