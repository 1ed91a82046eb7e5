//! Shortening-service port and response contract.
//!
//! The HTTP implementation lives in the `tsb-shortener` adapter crate.

use async_trait::async_trait;
use serde::Deserialize;

/// A failed shorten attempt. Transport failures, timeouts, non-JSON bodies
/// and rejected statuses all collapse into this one error: the external
/// service's unstructured failures are not modeled further, and the caller
/// reacts the same way to all of them (drop the link, keep going).
#[derive(Debug, thiserror::Error)]
#[error("shorten failed: {0}")]
pub struct ShortenError(pub String);

/// Wire shape of the shortening service's JSON reply.
///
/// Decoded strictly into this contract; any shape mismatch fails closed as a
/// `ShortenError` instead of being poked at dynamically.
#[derive(Clone, Debug, Deserialize)]
pub struct ShortenResponse {
    pub status: String,
    #[serde(rename = "shortenedUrl")]
    pub shortened_url: Option<String>,
}

impl ShortenResponse {
    /// The shortened URL, iff the service reported success.
    pub fn into_success(self) -> Result<String, ShortenError> {
        if self.status != "success" {
            return Err(ShortenError(format!("service status '{}'", self.status)));
        }
        match self.shortened_url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(ShortenError("success without shortenedUrl".to_string())),
        }
    }
}

/// Port to the external link-shortening service.
///
/// One network round trip per call; no retries, no circuit breaking. The
/// conversion pipeline and the connect flow are the only callers.
#[async_trait]
pub trait ShortenerClient: Send + Sync {
    /// Exchange `canonical_url` for a shortened URL using the user's key.
    async fn shorten(&self, api_key: &str, canonical_url: &str) -> Result<String, ShortenError>;

    /// Probe the key against a fixed, well-known test URL. Reports only
    /// usability; never persists anything. Used exclusively at connect time,
    /// before the credential is stored.
    async fn validate_credential(&self, api_key: &str) -> bool;
}
