//! HTTP adapter for the external link-shortening service.
//!
//! The whole contract is one GET with `api`/`url` query parameters and a
//! small JSON body; everything that is not a `status == "success"` body with
//! a `shortenedUrl` collapses into `ShortenError`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use tsb_core::shorten::{ShortenError, ShortenResponse, ShortenerClient};

#[derive(Clone, Debug)]
pub struct HttpShortener {
    api_url: String,
    validation_test_url: String,
    http: reqwest::Client,
}

impl HttpShortener {
    pub fn new(
        api_url: impl Into<String>,
        validation_test_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build");
        Self {
            api_url: api_url.into(),
            validation_test_url: validation_test_url.into(),
            http,
        }
    }

    async fn call(&self, api_key: &str, target_url: &str) -> Result<String, ShortenError> {
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[("api", api_key), ("url", target_url)])
            .send()
            .await
            .map_err(|e| ShortenError(format!("request error: {e}")))?;

        let body: ShortenResponse = resp
            .json()
            .await
            .map_err(|e| ShortenError(format!("response decode error: {e}")))?;

        body.into_success()
    }
}

#[async_trait]
impl ShortenerClient for HttpShortener {
    async fn shorten(&self, api_key: &str, canonical_url: &str) -> Result<String, ShortenError> {
        let short = self.call(api_key, canonical_url).await?;
        debug!(canonical = canonical_url, short = %short, "link shortened");
        Ok(short)
    }

    async fn validate_credential(&self, api_key: &str) -> bool {
        self.call(api_key, &self.validation_test_url).await.is_ok()
    }
}
