//! HTTP access used by collectors and the app-name resolver.

use std::time::Duration;

use async_trait::async_trait;

use crate::api::CollectError;

/// Minimal GET interface, so tests can script responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, CollectError>;

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CollectError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CollectError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("switcher-stats/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CollectError::unavailable("http client", e))?;
        Ok(Self { http_client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, CollectError> {
        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CollectError::unavailable(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::unavailable(
                url,
                format!("server answered with status {status}"),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, CollectError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| CollectError::unavailable(url, e))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CollectError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| CollectError::unavailable(url, e))?;
        Ok(bytes.to_vec())
    }
}
