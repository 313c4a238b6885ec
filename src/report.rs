//! Output formatting for sync results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;

use crate::reconcile::{ItemOutcome, OpKind, SyncPlan, SyncReport};

/// JSON report for a completed run.
#[derive(Serialize)]
pub struct JsonReport {
    pub version: String,
    pub events_extracted: usize,
    pub remote_entries: usize,
    pub inserted: usize,
    pub updated: usize,
    pub archived: usize,
    pub failed: usize,
    pub passed: bool,
    pub operations: Vec<JsonOperation>,
}

#[derive(Serialize)]
pub struct JsonOperation {
    pub op: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON rendering of a dry-run plan.
#[derive(Serialize)]
pub struct JsonPlan {
    pub events_extracted: usize,
    pub remote_entries: usize,
    pub insert: Vec<String>,
    pub update: Vec<String>,
    pub archive: Vec<String>,
}

fn operation_to_json(outcome: &ItemOutcome) -> JsonOperation {
    JsonOperation {
        op: outcome.op.as_str().to_string(),
        event: outcome.event_name.clone(),
        page_id: outcome.page_id.clone(),
        error: outcome.error.clone(),
    }
}

/// Write a completed run in JSON format.
pub fn write_json(extracted: usize, report: &SyncReport) -> anyhow::Result<()> {
    let json = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        events_extracted: extracted,
        remote_entries: report.fetched,
        inserted: report.count(OpKind::Insert),
        updated: report.count(OpKind::Update),
        archived: report.count(OpKind::Archive),
        failed: report.failed().len(),
        passed: report.succeeded(),
        operations: report.outcomes.iter().map(operation_to_json).collect(),
    };

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Write a completed run in colored terminal format.
pub fn write_pretty(path: &str, extracted: usize, report: &SyncReport) {
    println!();
    print!("  ");
    print!("{}", "eventsync".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning:  ".dimmed());
    println!("{}", path);
    print!("  {}", "Extracted: ".dimmed());
    println!("{} events", extracted);
    print!("  {}", "Remote:    ".dimmed());
    println!("{} entries", report.fetched);
    println!();

    println!(
        "  {} inserted, {} updated, {} archived",
        report.count(OpKind::Insert),
        report.count(OpKind::Update),
        report.count(OpKind::Archive)
    );

    let failed = report.failed();
    if !failed.is_empty() {
        println!();
        println!(
            "  {}",
            format!("{} operations failed:", failed.len()).red().bold()
        );
        for outcome in &failed {
            let target = match &outcome.page_id {
                Some(id) => format!("{} (page {})", outcome.event_name, id),
                None => outcome.event_name.clone(),
            };
            println!(
                "    {} {} {}: {}",
                "✗".red(),
                outcome.op,
                target,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    println!();
    if report.succeeded() {
        println!("  {}", "SYNCED".green().bold());
    } else {
        println!("  {}", "FAILED".red().bold());
    }
    println!();
}

/// Write a dry-run plan in JSON format.
pub fn write_plan_json(
    extracted: usize,
    remote_entries: usize,
    plan: &SyncPlan,
) -> anyhow::Result<()> {
    let json = JsonPlan {
        events_extracted: extracted,
        remote_entries,
        insert: plan.to_insert.iter().map(|r| r.name.clone()).collect(),
        update: plan.to_update.iter().map(|(r, _)| r.name.clone()).collect(),
        archive: plan.to_archive.iter().map(|e| e.name.clone()).collect(),
    };

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Write a dry-run plan in colored terminal format.
pub fn write_plan_pretty(path: &str, extracted: usize, remote_entries: usize, plan: &SyncPlan) {
    println!();
    print!("  ");
    print!("{}", "eventsync".cyan().bold());
    println!(" v{} {}", env!("CARGO_PKG_VERSION"), "(dry run)".dimmed());
    println!();

    print!("  {}", "Scanning:  ".dimmed());
    println!("{}", path);
    print!("  {}", "Extracted: ".dimmed());
    println!("{} events", extracted);
    print!("  {}", "Remote:    ".dimmed());
    println!("{} entries", remote_entries);
    println!();

    if plan.is_empty() {
        println!("  {}", "Nothing to do".green());
        println!();
        return;
    }

    for (record, entry) in &plan.to_update {
        println!("  {} {} (page {})", "~".yellow(), record.name, entry.id);
    }
    for record in &plan.to_insert {
        println!("  {} {}", "+".green(), record.name);
    }
    for entry in &plan.to_archive {
        println!("  {} {} (page {})", "-".red(), entry.name, entry.id);
    }
    println!();
}
