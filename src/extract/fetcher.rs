use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;

/// One retrieved page
#[derive(Clone, Debug)]
pub struct FetchedPage {
    pub status: u16,
    /// Markup decoded with the charset from `Content-Type`, UTF-8 when absent
    pub body: String,
}

/// Retrieves the markup of a single page. Implementations do not retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// `PageFetcher` over a reqwest client with a hard per-request timeout
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("catalog_etl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes, status {})", url, body.len(), status.as_u16());
        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}
