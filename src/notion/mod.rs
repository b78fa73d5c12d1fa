//! Remote record store: a Notion database reached over its REST API.
//!
//! The synchronizer only ever reads records and applies partial property
//! updates; it never creates or deletes rows. Requests are not retried here;
//! retry policy belongs to the caller.

pub mod endpoints;
pub mod error;
pub mod queries;
pub mod record;
pub mod responses;

pub use endpoints::Endpoints;
pub use error::StoreError;
pub use record::Record;

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use self::responses::QueryResponse;

/// Operations the synchronizer needs from the record store.
///
/// Object-safe so the pipeline can hold an `Arc<dyn RemoteStore>` and tests
/// can substitute an in-memory store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List records of the collection matching `filter`, following
    /// pagination to the end. Order is whatever the store returns.
    async fn query(&self, filter: Option<&Value>) -> Result<Vec<Record>, StoreError>;

    /// Fetch one record by id; `Ok(None)` when the store does not know it.
    async fn get_record(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Apply a partial property update (`{"<name>": <payload>, ..}`).
    async fn patch_record(&self, id: &str, properties: &Value) -> Result<(), StoreError>;
}

/// HTTP client for one Notion database, authenticated with a bearer token.
pub struct NotionClient {
    client: Client,
    endpoints: Endpoints,
    database_id: String,
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("endpoints", &self.endpoints)
            .field("database_id", &self.database_id)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(
        token: &str,
        database_id: &str,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("Notion token contains characters not allowed in a header")?;
        auth.set_sensitive(true);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(AUTHORIZATION, auth);
        default_headers.insert(
            "Notion-Version",
            HeaderValue::from_static(endpoints::NOTION_VERSION),
        );
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            database_id: database_id.to_string(),
        })
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<String, StoreError> {
        let response = request.send().await.map_err(|source| StoreError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| StoreError::Transport {
                url: url.to_string(),
                source,
            })?;
        if !status.is_success() {
            return Err(StoreError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str, url: &str) -> Result<T, StoreError> {
        serde_json::from_str(body).map_err(|source| StoreError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RemoteStore for NotionClient {
    async fn query(&self, filter: Option<&Value>) -> Result<Vec<Record>, StoreError> {
        let url = self.endpoints.database_query(&self.database_id);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        loop {
            let body = queries::query_body(filter, cursor.as_deref());
            tracing::debug!("POST {} (cursor: {:?})", url, cursor);
            let text = self.send(self.client.post(&url).json(&body), &url).await?;
            let page: QueryResponse = Self::decode(&text, &url)?;
            let next = page.continuation().map(str::to_owned);
            tracing::debug!(
                "Query page returned {} records (has_more: {})",
                page.results.len(),
                page.has_more
            );
            records.extend(page.results);
            match next {
                Some(c) if !seen_cursors.insert(c.clone()) => {
                    return Err(StoreError::StalledPagination { url, cursor: c });
                }
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        Ok(records)
    }

    async fn get_record(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let url = self.endpoints.page(id);
        tracing::debug!("GET {}", url);
        match self.send(self.client.get(&url), &url).await {
            Ok(text) => Ok(Some(Self::decode(&text, &url)?)),
            Err(StoreError::RemoteRejected { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn patch_record(&self, id: &str, properties: &Value) -> Result<(), StoreError> {
        let url = self.endpoints.page(id);
        tracing::debug!("PATCH {}", url);
        let body = queries::patch_body(properties);
        self.send(self.client.patch(&url).json(&body), &url).await?;
        Ok(())
    }
}
