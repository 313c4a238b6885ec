//! eventsync - analytics event catalog synchronization.
//!
//! eventsync keeps a Notion database of analytics events in step with what
//! the code actually logs. It statically extracts every call to the one
//! method annotated with `@EventLogger` from a Java source tree, then
//! reconciles the extracted set against the remote catalog: new events are
//! inserted, matching rows are updated, and rows whose events are no longer
//! logged are archived.
//!
//! # Architecture
//!
//! - `extract`: tree-sitter based extraction (symbol table + call sites)
//! - `catalog`: the remote store interface and its Notion implementation
//! - `reconcile`: diffing and concurrent mutation batches
//! - `config`: YAML run configuration
//! - `report`: output formatting (pretty, JSON)
//! - `cli`: the sync and init commands

pub mod catalog;
pub mod cli;
pub mod config;
pub mod extract;
pub mod reconcile;
pub mod report;

pub use catalog::{CatalogError, CatalogPage, CatalogStore, NotionClient, RemoteEntry};
pub use config::{Config, ResolvedConfig};
pub use extract::{
    parse_java, DefaultExtractor, EventExtractor, EventRecord, SourceFile, LOGGER_ANNOTATION,
};
pub use reconcile::{plan, reconcile, ItemOutcome, OpKind, SyncPlan, SyncReport};
