//! Run configuration for eventsync.
//!
//! Everything a run needs to reach the remote catalog lives in one YAML
//! file: the database id, the two column names, and optionally the auth
//! token (the `EVENTSYNC_TOKEN` environment variable takes precedence so
//! tokens can stay out of committed files). Required values are validated
//! up front, before any parsing or network activity.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding the configured auth token.
pub const TOKEN_ENV_VAR: &str = "EVENTSYNC_TOKEN";

/// Raw configuration as read from disk. All fields optional; see
/// [`Config::resolve`] for required-value enforcement.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Notion integration token. `EVENTSYNC_TOKEN` wins if both are set.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Id of the database holding the event catalog.
    #[serde(default)]
    pub database_id: Option<String>,
    /// Name of the title column holding event names.
    #[serde(default)]
    pub event_column: Option<String>,
    /// Name of the rich-text column holding parameter lines.
    #[serde(default)]
    pub parameters_column: Option<String>,
    /// Glob patterns for paths to exclude from analysis (e.g. "**/build/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Enforce required values, producing a [`ResolvedConfig`].
    ///
    /// Each missing value fails with a message naming the key, checked in a
    /// fixed order so errors are stable.
    pub fn resolve(self) -> anyhow::Result<ResolvedConfig> {
        let auth_token = std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.is_empty())
            .or(self.auth_token)
            .filter(|t| !t.is_empty());

        let auth_token = auth_token.ok_or_else(|| {
            anyhow::anyhow!(
                "auth token is missing (set auth_token in the config file or the {} environment variable)",
                TOKEN_ENV_VAR
            )
        })?;
        let database_id = require(self.database_id, "database_id")?;
        let event_column = require(self.event_column, "event_column")?;
        let parameters_column = require(self.parameters_column, "parameters_column")?;

        Ok(ResolvedConfig {
            auth_token,
            database_id,
            event_column,
            parameters_column,
            excluded_paths: self.excluded_paths,
        })
    }
}

fn require(value: Option<String>, key: &str) -> anyhow::Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} is missing from the configuration", key))
}

/// Configuration with every required value present.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub auth_token: String,
    pub database_id: String,
    pub event_column: String,
    pub parameters_column: String,
    pub excluded_paths: Vec<String>,
}

impl ResolvedConfig {
    /// Check if a path matches any excluded_paths pattern.
    /// Uses globset, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }
}
