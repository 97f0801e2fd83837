use std::time::Duration;

use reqwest::Client;

use crate::config::CatalogConfig;
use crate::error::{FinderError, Result};

/// Plain HTML fetcher shared by the catalog and storage clients.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FinderError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` and return the body. Non-success statuses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        tracing::info!(url, "Fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FinderError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Page request failed");
            return Err(FinderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FinderError::Http {
            url: url.to_string(),
            source,
        })
    }
}
