//! Notion implementation of the catalog store.
//!
//! Endpoints used:
//! - `POST /v1/databases/{id}/query` — paginated row fetch
//! - `POST /v1/pages` — insert
//! - `PATCH /v1/pages/{id}` — update / archive
//!
//! One pooled `reqwest::Client` serves the whole run; every request carries
//! bearer auth and the pinned `Notion-Version` header. Catalog APIs of this
//! kind are rate limited, so timeouts are generous rather than snappy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};

use super::wire;
use super::{CatalogError, CatalogPage, CatalogStore};
use crate::extract::EventRecord;

const BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION_HEADER: &str = "Notion-Version";
const NOTION_VERSION_VALUE: &str = "2022-06-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Notion-backed [`CatalogStore`].
pub struct NotionClient {
    http: reqwest::Client,
    auth_token: String,
    database_id: String,
    event_column: String,
    parameters_column: String,
}

impl NotionClient {
    pub fn new(
        auth_token: String,
        database_id: String,
        event_column: String,
        parameters_column: String,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("eventsync/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            auth_token,
            database_id,
            event_column,
            parameters_column,
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.auth_token)
            .header(NOTION_VERSION_HEADER, NOTION_VERSION_VALUE)
    }

    /// Send a request, mapping timeouts and non-success statuses.
    ///
    /// The response body of a failed call is preserved in the error: the
    /// catalog's error payloads are the only way to diagnose a rejected
    /// mutation.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, CatalogError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout
            } else {
                CatalogError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CatalogStore for NotionClient {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<CatalogPage, CatalogError> {
        let url = format!("{}/databases/{}/query", BASE_URL, self.database_id);
        let body = wire::QueryRequest {
            start_cursor: cursor.map(str::to_string),
        };

        let response = self.send(self.request(Method::POST, &url).json(&body)).await?;
        let parsed: wire::QueryResponse = response.json().await?;

        if std::env::var("EVENTSYNC_DEBUG").is_ok() {
            eprintln!(
                "[debug] fetched page of {} rows, has_more={}",
                parsed.results.len(),
                parsed.has_more
            );
        }

        let entries = parsed
            .results
            .into_iter()
            .map(|page| wire::decode_entry(page, &self.event_column, &self.parameters_column))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CatalogPage {
            entries,
            next_cursor: parsed.next_cursor,
        })
    }

    async fn insert(&self, record: &EventRecord) -> Result<(), CatalogError> {
        let url = format!("{}/pages", BASE_URL);
        let body = wire::InsertPageRequest {
            parent: wire::Parent {
                database_id: self.database_id.clone(),
            },
            properties: wire::event_properties(record, &self.event_column, &self.parameters_column),
        };

        self.send(self.request(Method::POST, &url).json(&body)).await?;
        Ok(())
    }

    async fn update(&self, record: &EventRecord, page_id: &str) -> Result<(), CatalogError> {
        let url = format!("{}/pages/{}", BASE_URL, page_id);
        let body = wire::PatchPageRequest {
            properties: wire::event_properties(record, &self.event_column, &self.parameters_column),
        };

        self.send(self.request(Method::PATCH, &url).json(&body)).await?;
        Ok(())
    }

    async fn archive(&self, page_id: &str) -> Result<(), CatalogError> {
        let url = format!("{}/pages/{}", BASE_URL, page_id);
        let body = wire::ArchivePageRequest { archived: true };

        self.send(self.request(Method::PATCH, &url).json(&body)).await?;
        Ok(())
    }
}
