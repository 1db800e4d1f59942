//! REST pending store
//!
//! Inserts rows through the backing store's PostgREST interface using the
//! service-role key.

use super::{PendingRow, PendingStore};
use crate::delivery::ingest::truncate_body;
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::Client;

/// PostgREST-style insert endpoint
#[derive(Debug, Clone)]
pub struct RestPendingStore {
    client: Client,
    endpoint: String,
    service_key: String,
}

impl RestPendingStore {
    /// # Arguments
    ///
    /// * `client` - HTTP client
    /// * `base_url` - Store base URL, e.g. `https://<project>.supabase.co`
    /// * `service_key` - Elevated credential sent as `apikey` and bearer token
    /// * `table` - Target table
    pub fn new(client: Client, base_url: &str, service_key: &str, table: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            service_key: service_key.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PendingStore for RestPendingStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn insert(&self, row: &PendingRow) -> StoreResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::store::tests::sample_row;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let store = RestPendingStore::new(
            Client::new(),
            "https://project.supabase.co/",
            "key",
            "pending_news",
        );
        assert_eq!(
            store.endpoint(),
            "https://project.supabase.co/rest/v1/pending_news"
        );
    }

    #[tokio::test]
    async fn test_insert_sends_credentials_and_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/pending_news"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("prefer", "return=minimal"))
            .and(body_partial_json(serde_json::json!({
                "title_raw": "Title",
                "processed": false,
                "fetched_at": "2024-06-10T12:00:00Z",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = RestPendingStore::new(Client::new(), &server.uri(), "service-key", "pending_news");
        store.insert(&sample_row()).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let store = RestPendingStore::new(Client::new(), &server.uri(), "wrong", "pending_news");
        let err = store.insert(&sample_row()).await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 401, .. }));
    }
}
