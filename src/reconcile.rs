//! Reconciliation of extracted events against the remote catalog.
//!
//! A run fetches the full remote collection (sequential cursor pagination,
//! fully materialized before diffing), computes the insert/update/archive
//! partition, then applies mutations in two concurrent batches: updates and
//! inserts together first, archives only after that batch has fully joined.
//! The ordering means an event renamed in source gains its new row before
//! the stale row is archived, and nothing inserted in a run can be archived
//! by the same run.
//!
//! Mutation failures are collected per item, never cancelling siblings; a
//! fetch failure aborts the run before any mutation, since a diff against
//! unknown remote state could archive rows that are still live.

use std::collections::{BTreeMap, BTreeSet};

use futures::stream::{self, StreamExt};

use crate::catalog::{CatalogError, CatalogStore, RemoteEntry};
use crate::extract::EventRecord;

/// Concurrent mutations in flight per batch.
const MAX_IN_FLIGHT: usize = 8;

/// The three-way partition of local records and remote entries.
///
/// Every local record lands in exactly one of `to_insert`/`to_update`;
/// every remote entry in exactly one of `to_update`/`to_archive`.
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub to_insert: Vec<EventRecord>,
    pub to_update: Vec<(EventRecord, RemoteEntry)>,
    pub to_archive: Vec<RemoteEntry>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_archive.is_empty()
    }
}

/// The kind of mutation an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Insert,
    Update,
    Archive,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Insert => "insert",
            OpKind::Update => "update",
            OpKind::Archive => "archive",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of one mutation, success or failure.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub op: OpKind,
    pub event_name: String,
    /// Remote page handle for updates and archives.
    pub page_id: Option<String>,
    pub error: Option<String>,
}

/// Everything that happened during one reconciliation run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Remote entries fetched before diffing.
    pub fetched: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl SyncReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    pub fn failed(&self) -> Vec<&ItemOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some()).collect()
    }

    pub fn count(&self, op: OpKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.op == op && o.error.is_none())
            .count()
    }
}

/// Key local records by event name, last declaration wins.
///
/// The `BTreeMap` gives lexicographic order by event name, so planning and
/// application order are deterministic across runs.
fn dedup_local(local: Vec<EventRecord>) -> BTreeMap<String, EventRecord> {
    local
        .into_iter()
        .map(|record| (record.name.clone(), record))
        .collect()
}

/// Compute the three-way diff between local records and remote entries.
pub fn plan(local: Vec<EventRecord>, remote: Vec<RemoteEntry>) -> SyncPlan {
    let local_map = dedup_local(local);

    let mut matched: BTreeSet<String> = BTreeSet::new();
    let mut to_update = Vec::new();
    let mut to_archive = Vec::new();

    for entry in remote {
        match local_map.get(&entry.name) {
            Some(record) => {
                matched.insert(entry.name.clone());
                to_update.push((record.clone(), entry));
            }
            None => to_archive.push(entry),
        }
    }

    let to_insert = local_map
        .into_iter()
        .filter(|(name, _)| !matched.contains(name))
        .map(|(_, record)| record)
        .collect();

    SyncPlan {
        to_insert,
        to_update,
        to_archive,
    }
}

/// Fetch the entire remote collection, one page at a time.
///
/// Pages are strictly sequential: each cursor comes from the previous
/// response.
pub async fn fetch_remote<S: CatalogStore>(store: &S) -> Result<Vec<RemoteEntry>, CatalogError> {
    let mut entries = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = store.fetch_page(cursor.as_deref()).await?;
        entries.extend(page.entries);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(entries)
}

enum PlannedOp {
    Insert(EventRecord),
    Update(EventRecord, RemoteEntry),
    Archive(RemoteEntry),
}

async fn run_op<S: CatalogStore>(store: &S, op: PlannedOp) -> ItemOutcome {
    match op {
        PlannedOp::Insert(record) => {
            let error = store.insert(&record).await.err().map(|e| e.to_string());
            ItemOutcome {
                op: OpKind::Insert,
                event_name: record.name,
                page_id: None,
                error,
            }
        }
        PlannedOp::Update(record, entry) => {
            let error = store
                .update(&record, &entry.id)
                .await
                .err()
                .map(|e| e.to_string());
            ItemOutcome {
                op: OpKind::Update,
                event_name: record.name,
                page_id: Some(entry.id),
                error,
            }
        }
        PlannedOp::Archive(entry) => {
            let error = store.archive(&entry.id).await.err().map(|e| e.to_string());
            ItemOutcome {
                op: OpKind::Archive,
                event_name: entry.name,
                page_id: Some(entry.id),
                error,
            }
        }
    }
}

/// Run one batch of mutations concurrently, collecting every outcome.
///
/// A failing operation records its error and the rest of the batch keeps
/// running; there is no cancellation between siblings.
async fn run_batch<S: CatalogStore>(store: &S, ops: Vec<PlannedOp>) -> Vec<ItemOutcome> {
    stream::iter(ops)
        .map(|op| run_op(store, op))
        .buffer_unordered(MAX_IN_FLIGHT)
        .collect()
        .await
}

/// Apply a plan: the update+insert batch joins fully before archives start.
pub async fn apply<S: CatalogStore>(store: &S, plan: SyncPlan) -> Vec<ItemOutcome> {
    let upserts: Vec<PlannedOp> = plan
        .to_update
        .into_iter()
        .map(|(record, entry)| PlannedOp::Update(record, entry))
        .chain(plan.to_insert.into_iter().map(PlannedOp::Insert))
        .collect();
    let archives: Vec<PlannedOp> = plan.to_archive.into_iter().map(PlannedOp::Archive).collect();

    let mut outcomes = run_batch(store, upserts).await;
    outcomes.extend(run_batch(store, archives).await);
    outcomes
}

/// Fetch, diff, and apply in one run.
pub async fn reconcile<S: CatalogStore>(
    store: &S,
    local: Vec<EventRecord>,
) -> Result<SyncReport, CatalogError> {
    let remote = fetch_remote(store).await?;
    let fetched = remote.len();

    let sync_plan = plan(local, remote);

    if std::env::var("EVENTSYNC_DEBUG").is_ok() {
        let update: Vec<&str> = sync_plan.to_update.iter().map(|(r, _)| r.name.as_str()).collect();
        let insert: Vec<&str> = sync_plan.to_insert.iter().map(|r| r.name.as_str()).collect();
        let archive: Vec<&str> = sync_plan.to_archive.iter().map(|e| e.name.as_str()).collect();
        eprintln!(
            "[debug] plan: update {:?}, insert {:?}, archive {:?}",
            update, insert, archive
        );
    }

    let outcomes = apply(store, sync_plan).await;
    Ok(SyncReport { fetched, outcomes })
}
