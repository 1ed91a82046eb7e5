use std::sync::Arc;

use tsb_core::{config::Config, shorten::ShortenerClient, store::CredentialStore};
use tsb_shortener::HttpShortener;
use tsb_store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), tsb_core::Error> {
    tsb_core::logging::init("tsb")?;

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn CredentialStore> = Arc::new(SqliteStore::new(&cfg.database_path)?);
    let shortener: Arc<dyn ShortenerClient> = Arc::new(HttpShortener::new(
        cfg.shortener_api_url.clone(),
        cfg.validation_test_url.clone(),
        cfg.http_timeout,
    ));

    tsb_telegram::router::run_polling(cfg, store, shortener)
        .await
        .map_err(|e| tsb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
