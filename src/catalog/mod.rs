//! Remote event catalog access.
//!
//! The catalog is an external tabular store reached through a four-operation
//! interface: paginated fetch, insert, update, archive. [`NotionClient`] is
//! the production implementation; the reconciler only sees [`CatalogStore`],
//! so tests substitute an in-memory store.

mod client;
mod wire;

pub use client::NotionClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::extract::EventRecord;

/// Errors from catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed catalog row: {0}")]
    Malformed(String),
}

/// One row already present in the remote catalog. Fetched fresh each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Opaque page handle used for update and archive calls.
    pub id: String,
    /// The event name this row documents.
    pub name: String,
    /// Rendered parameter lines as stored remotely.
    pub parameter_lines: Vec<String>,
}

/// One page of fetched entries plus the cursor for the next page.
#[derive(Debug, Default)]
pub struct CatalogPage {
    pub entries: Vec<RemoteEntry>,
    pub next_cursor: Option<String>,
}

/// The operation set the reconciler drives.
///
/// Implementations must be safe for concurrent use: mutation batches run
/// many operations against one shared store instance.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch one page of entries. `None` cursor starts from the beginning;
    /// a `None` cursor in the response signals the final page.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<CatalogPage, CatalogError>;

    /// Create a new row for `record`.
    async fn insert(&self, record: &EventRecord) -> Result<(), CatalogError>;

    /// Overwrite the row `page_id` with `record`'s current shape.
    async fn update(&self, record: &EventRecord, page_id: &str) -> Result<(), CatalogError>;

    /// Archive the row `page_id`.
    async fn archive(&self, page_id: &str) -> Result<(), CatalogError>;
}
