// src/ingest/fetcher.rs
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::ingest::config::IngestConfig;
use crate::ingest::dedup::DedupGate;
use crate::ingest::error::FetchError;
use crate::ingest::extract::extract_content;
use crate::ingest::feed::{parse_feed, FeedDocument};
use crate::ingest::normalize::normalize_entry;
use crate::ingest::transport::FeedTransport;
use crate::ingest::types::{Article, FeedSource};

/// Per-source acceptance limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_articles_per_feed: usize,
    pub min_article_length: usize,
    pub request_timeout: Duration,
}

impl From<&IngestConfig> for FetchLimits {
    fn from(cfg: &IngestConfig) -> Self {
        Self {
            max_articles_per_feed: cfg.max_articles_per_feed,
            min_article_length: cfg.min_article_length,
            request_timeout: cfg.request_timeout(),
        }
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

/// Fetches one feed and turns its entries into accepted articles.
pub struct SourceFetcher {
    transport: Arc<dyn FeedTransport>,
    gate: DedupGate,
    limits: FetchLimits,
}

impl SourceFetcher {
    pub fn new(transport: Arc<dyn FeedTransport>, gate: DedupGate, limits: FetchLimits) -> Self {
        Self {
            transport,
            gate,
            limits,
        }
    }

    pub fn limits(&self) -> FetchLimits {
        self.limits
    }

    /// Never fails: any error is logged and the source contributes nothing.
    pub async fn fetch_source(&self, source: &FeedSource) -> Vec<Article> {
        info!(target: "ingest", %source, "fetching feed");
        counter!("ingest_sources_total").increment(1);
        let t0 = std::time::Instant::now();

        match self.try_fetch(source).await {
            Ok(articles) => {
                histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                counter!("ingest_articles_total").increment(articles.len() as u64);
                info!(target: "ingest", %source, count = articles.len(), "fetched feed");
                articles
            }
            Err(e) if e.is_transport() => {
                warn!(target: "ingest", %source, error = %e, "HTTP error fetching feed");
                counter!("ingest_source_errors_total", "kind" => "transport").increment(1);
                Vec::new()
            }
            Err(e) => {
                error!(target: "ingest", %source, error = %e, "error fetching or parsing feed");
                counter!("ingest_source_errors_total", "kind" => "parse").increment(1);
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, source: &FeedSource) -> Result<Vec<Article>, FetchError> {
        let deadline = self.limits.request_timeout;
        let body = tokio::time::timeout(deadline, self.transport.get(source.as_str()))
            .await
            .map_err(|_| FetchError::Timeout(deadline))??;

        let doc = parse_feed(&body)?;
        Ok(self.accept_entries(&doc, source).await)
    }

    /// Document order; stops at the cap without looking at later entries.
    async fn accept_entries(&self, doc: &FeedDocument, source: &FeedSource) -> Vec<Article> {
        let mut out = Vec::new();

        for entry in &doc.entries {
            if out.len() >= self.limits.max_articles_per_feed {
                break;
            }
            let title = entry.title.as_deref().unwrap_or("No Title");

            let content = extract_content(entry);
            if content.chars().count() < self.limits.min_article_length {
                debug!(target: "ingest", %source, title, "skipping short article");
                counter!("ingest_skipped_short_total").increment(1);
                continue;
            }

            let fp = DedupGate::fingerprint(&content);
            if self.gate.is_duplicate(&fp).await {
                debug!(target: "ingest", %source, title, "skipping duplicate article");
                counter!("ingest_skipped_duplicate_total").increment(1);
                continue;
            }
            // Another in-flight source may have recorded the same body since the check.
            if !self.gate.record(fp).await {
                debug!(target: "ingest", %source, title, "skipping duplicate article");
                counter!("ingest_skipped_duplicate_total").increment(1);
                continue;
            }

            out.push(normalize_entry(entry, &doc.meta, content, source.as_str()));
        }

        out
    }
}
