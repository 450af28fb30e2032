//! Feed ingest service: binary entrypoint.
//! Loads config and the feed list, wires the pipeline, then either runs one
//! cycle (`INGEST_ONCE=1`) or ticks on the configured interval until Ctrl-C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_ingest::ingest::config::{load_config_default, load_feeds_default};
use feed_ingest::ingest::dedup::FileSeenStore;
use feed_ingest::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg};
use feed_ingest::ingest::sink::JsonlSink;
use feed_ingest::ingest::transport::HttpTransport;
use feed_ingest::{run_cycle, BatchCoordinator, DedupGate, FetchLimits, SourceFetcher};

/// Compact logs by default; `INGEST_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("INGEST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("loading ingest config")?;
    let sources = load_feeds_default(&cfg).context("loading feed list")?;
    if sources.is_empty() {
        warn!(target: "ingest", path = %cfg.feeds_path.display(), "no feeds configured");
    }
    info!(
        target: "ingest",
        feeds = sources.len(),
        batch_size = cfg.batch_size,
        max_articles_per_feed = cfg.max_articles_per_feed,
        min_article_length = cfg.min_article_length,
        "feed ingest starting"
    );

    let store = Arc::new(FileSeenStore::open(&cfg.seen_store_path).await?);
    let transport = Arc::new(HttpTransport::new(cfg.request_timeout())?);
    let fetcher = SourceFetcher::new(transport, DedupGate::new(store), FetchLimits::from(&cfg));
    let coordinator = Arc::new(BatchCoordinator::new(fetcher, cfg.batch_delay()));
    let sink = Arc::new(JsonlSink::new(&cfg.output_path));

    let once = std::env::var("INGEST_ONCE").ok().is_some_and(|v| v == "1");
    if once {
        let report = run_cycle(&coordinator, &sources, cfg.batch_size, sink.as_ref()).await?;
        info!(target: "ingest", accepted = report.accepted, output = %cfg.output_path.display(), "single cycle done");
        return Ok(());
    }

    let handle = spawn_scheduler(
        IngestSchedulerCfg {
            interval: cfg.interval(),
            batch_size: cfg.batch_size,
        },
        sources,
        coordinator,
        sink,
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!(target: "ingest", "shutting down");
    handle.abort();
    Ok(())
}
