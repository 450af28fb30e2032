// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::types::FeedSource;

const ENV_CONFIG_PATH: &str = "INGEST_CONFIG_PATH";
const ENV_FEEDS_PATH: &str = "INGEST_FEEDS_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/ingest.toml";

fn default_max_articles_per_feed() -> usize {
    10
}
fn default_min_article_length() -> usize {
    100
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_batch_size() -> usize {
    5
}
fn default_batch_delay_ms() -> u64 {
    500
}
fn default_interval_secs() -> u64 {
    3600
}

/// Numeric thresholds and file locations for the ingest service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    #[serde(default = "default_max_articles_per_feed")]
    pub max_articles_per_feed: usize,
    /// Minimum content length in characters, inclusive.
    #[serde(default = "default_min_article_length")]
    pub min_article_length: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Scheduler period between cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_feeds_path")]
    pub feeds_path: PathBuf,
    #[serde(default = "default_seen_store_path")]
    pub seen_store_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_feeds_path() -> PathBuf {
    PathBuf::from("config/feeds.toml")
}
fn default_seen_store_path() -> PathBuf {
    PathBuf::from("data/seen_fingerprints.txt")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("data/articles.jsonl")
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_articles_per_feed: default_max_articles_per_feed(),
            min_article_length: default_min_article_length(),
            request_timeout_secs: default_request_timeout_secs(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            interval_secs: default_interval_secs(),
            feeds_path: default_feeds_path(),
            seen_store_path: default_seen_store_path(),
            output_path: default_output_path(),
        }
    }
}

impl IngestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn sanitize(mut self) -> Self {
        if self.batch_size == 0 {
            self.batch_size = 1;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        if self.interval_secs == 0 {
            self.interval_secs = default_interval_secs();
        }
        self
    }
}

/// Load config from an explicit TOML file.
pub fn load_config_from(path: &Path) -> Result<IngestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ingest config from {}", path.display()))?;
    let cfg: IngestConfig = toml::from_str(&content)
        .with_context(|| format!("parsing ingest config {}", path.display()))?;
    Ok(cfg.sanitize())
}

/// Load config using env var + fallbacks:
/// 1) $INGEST_CONFIG_PATH
/// 2) config/ingest.toml
/// 3) built-in defaults
pub fn load_config_default() -> Result<IngestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("INGEST_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    Ok(IngestConfig::default())
}

/// Load the feed list from an explicit path. Supports TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let urls = parse_feeds(&content, ext.as_str())?;
    Ok(urls.into_iter().map(FeedSource::from).collect())
}

/// Load the feed list: $INGEST_FEEDS_PATH, then `cfg.feeds_path`.
/// A missing `cfg.feeds_path` yields an empty list.
pub fn load_feeds_default(cfg: &IngestConfig) -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_FEEDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        } else {
            return Err(anyhow!("INGEST_FEEDS_PATH points to non-existent path"));
        }
    }
    if cfg.feeds_path.exists() {
        return load_feeds_from(&cfg.feeds_path);
    }
    Ok(Vec::new())
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("feeds");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed list format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlFeeds {
        feeds: Vec<String>,
    }
    let v: TomlFeeds = toml::from_str(s)?;
    Ok(clean_list(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop blanks and repeats; first occurrence keeps its position.
fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}
