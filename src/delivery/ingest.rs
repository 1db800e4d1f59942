//! Client for the remote ingestion endpoint

use crate::pipeline::CanonicalItem;
use crate::DeliveryError;
use reqwest::Client;
use serde::Deserialize;

/// Body returned by the ingestion endpoint on success
///
/// Both fields are optional; an empty or non-JSON body is still a success.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub inserted: Option<serde_json::Value>,
}

/// Posts canonical items to the ingestion endpoint
#[derive(Debug, Clone)]
pub struct IngestClient {
    client: Client,
    url: String,
}

impl IngestClient {
    /// # Arguments
    ///
    /// * `client` - HTTP client; its timeout bounds each submission
    /// * `url` - Absolute endpoint URL
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submits one item
    ///
    /// # Returns
    ///
    /// * `Ok(IngestResponse)` - The endpoint answered 2xx
    /// * `Err(DeliveryError)` - Network failure, timeout, or non-2xx status
    pub async fn submit(&self, item: &CanonicalItem) -> Result<IngestResponse, DeliveryError> {
        let response = self.client.post(&self.url).json(item).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}

/// Keeps error bodies short enough for a log line
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    crate::pipeline::text::truncate_chars(body.trim(), MAX)
}
