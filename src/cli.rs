//! Command-line interface for eventsync.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog::NotionClient;
use crate::config::{Config, ResolvedConfig};
use crate::extract::{parse_java, DefaultExtractor, EventExtractor, SourceFile};
use crate::reconcile;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default config file names to search for.
const DEFAULT_CONFIG_NAMES: &[&str] = &["eventsync.yaml", ".eventsync.yaml"];

/// Keep an analytics event catalog in sync with Notion.
///
/// eventsync statically extracts analytics-event declarations from Java
/// sources (calls to the one method annotated with `@EventLogger`) and
/// reconciles them against a Notion database: new events are inserted,
/// existing rows are updated, and rows for events no longer logged are
/// archived.
#[derive(Parser)]
#[command(name = "eventsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract analytics events and sync them to the remote catalog
    Sync(SyncArgs),
    /// Create a starter eventsync configuration file
    Init(InitArgs),
}

/// Arguments for the sync command.
#[derive(Parser)]
pub struct SyncArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Compute and print the plan without mutating the remote catalog
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "eventsync.yaml")]
    pub output: PathBuf,
}

/// Discover a config file in the current directory.
fn discover_config() -> anyhow::Result<PathBuf> {
    for name in DEFAULT_CONFIG_NAMES {
        let path = PathBuf::from(name);
        if path.exists() {
            return Ok(path);
        }
    }
    anyhow::bail!(
        "no config file found (looked for {})",
        DEFAULT_CONFIG_NAMES.join(", ")
    )
}

/// Collect Java files to analyze.
fn collect_files(root: &Path, config: &ResolvedConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            // Skip build output and vendored directories
            if e.file_type().is_dir()
                && (name == "build" || name == "target" || name == "out" || name == "node_modules")
            {
                return false;
            }
            true
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

            if ext == "java" && !config.is_path_excluded(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Parse collected files, warning and skipping any that fail to parse.
fn parse_files(paths: &[PathBuf]) -> Vec<SourceFile> {
    let mut parsed = Vec::new();

    for path in paths {
        let source = match std::fs::read(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Warning: failed to read {}: {}", path.display(), e);
                continue;
            }
        };
        match parse_java(path, &source) {
            Ok(file) => parsed.push(file),
            Err(e) => {
                eprintln!("Warning: {}", e);
            }
        }
    }

    parsed
}

/// Run the sync command.
pub fn run_sync(args: &SyncArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    // Discover config if not specified
    let config_path = match &args.config {
        Some(p) => p.clone(),
        None => match discover_config() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Run 'eventsync init' to create a config file");
                return Ok(EXIT_ERROR);
            }
        },
    };

    // Parse and validate config before touching sources or the network
    let config = match Config::parse_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error parsing config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let config = match config.resolve() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let metadata = match std::fs::metadata(&abs_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = if metadata.is_dir() {
        collect_files(&abs_path, &config)?
    } else {
        vec![abs_path.clone()]
    };

    if files.is_empty() {
        eprintln!("Error: no Java files to scan under {}", abs_path.display());
        return Ok(EXIT_ERROR);
    }

    // Extract events
    let parsed = parse_files(&files);
    let events = match DefaultExtractor.extract(&parsed) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let extracted = events.len();

    let client = NotionClient::new(
        config.auth_token.clone(),
        config.database_id.clone(),
        config.event_column.clone(),
        config.parameters_column.clone(),
    )?;

    let runtime = tokio::runtime::Runtime::new()?;
    let path_str = args.path.to_string_lossy().to_string();

    if args.dry_run {
        let remote = match runtime.block_on(reconcile::fetch_remote(&client)) {
            Ok(remote) => remote,
            Err(e) => {
                eprintln!("Error: failed to fetch remote catalog: {}", e);
                return Ok(EXIT_ERROR);
            }
        };
        let remote_entries = remote.len();
        let plan = reconcile::plan(events, remote);

        match args.format.as_str() {
            "json" => report::write_plan_json(extracted, remote_entries, &plan)?,
            _ => report::write_plan_pretty(&path_str, extracted, remote_entries, &plan),
        }
        return Ok(EXIT_SUCCESS);
    }

    let sync_report = match runtime.block_on(reconcile::reconcile(&client, events)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: failed to fetch remote catalog: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match args.format.as_str() {
        "json" => report::write_json(extracted, &sync_report)?,
        _ => report::write_pretty(&path_str, extracted, &sync_report),
    }

    if sync_report.succeeded() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, include_str!("templates/eventsync.yaml")) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} with your database id and column names",
        args.output.display()
    );
    println!("  2. Export your integration token: EVENTSYNC_TOKEN=secret_...");
    println!(
        "  3. Run: eventsync sync <source-dir> --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}
