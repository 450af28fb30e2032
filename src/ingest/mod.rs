// src/ingest/mod.rs
pub mod batch;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod feed;
pub mod fetcher;
pub mod normalize;
pub mod scheduler;
pub mod sink;
pub mod transport;
pub mod types;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::batch::BatchCoordinator;
use crate::ingest::sink::ArticleSink;
use crate::ingest::types::FeedSource;

/// One-time metrics registration (so series show up in any installed recorder).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_sources_total", "Feed fetches attempted.");
        describe_counter!("ingest_articles_total", "Articles accepted from feeds.");
        describe_counter!(
            "ingest_skipped_short_total",
            "Entries rejected by the minimum length filter."
        );
        describe_counter!(
            "ingest_skipped_duplicate_total",
            "Entries rejected because their content was seen before."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Feed fetch/parse errors, labelled by kind."
        );
        describe_counter!("ingest_sink_errors_total", "Failed article hand-offs.");
        describe_counter!("ingest_cycles_total", "Completed ingest cycles.");
        describe_histogram!("ingest_fetch_ms", "Successful feed fetch time in milliseconds.");
        describe_gauge!("ingest_last_cycle_ts", "Unix ts when the last cycle finished.");
    });
}

/// Outcome of one [`run_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub sources: usize,
    pub accepted: usize,
}

/// Fetch every source once and hand the accepted articles to `sink`.
/// Only a sink failure is an error; source failures were already absorbed.
pub async fn run_cycle<S: ArticleSink + ?Sized>(
    coordinator: &BatchCoordinator,
    sources: &[FeedSource],
    batch_size: usize,
    sink: &S,
) -> Result<CycleReport> {
    ensure_metrics_described();

    let articles = coordinator.fetch_all(sources, batch_size).await;
    let report = CycleReport {
        sources: sources.len(),
        accepted: articles.len(),
    };

    if !articles.is_empty() {
        sink.store(articles)
            .await
            .context("handing articles to sink")?;
    }

    let now = chrono::Utc::now().timestamp().max(0);
    counter!("ingest_cycles_total").increment(1);
    gauge!("ingest_last_cycle_ts").set(now as f64);

    tracing::info!(
        target: "ingest",
        sources = report.sources,
        accepted = report.accepted,
        "ingest cycle finished"
    );
    Ok(report)
}
