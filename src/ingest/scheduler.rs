// src/ingest/scheduler.rs
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::batch::BatchCoordinator;
use crate::ingest::sink::ArticleSink;
use crate::ingest::types::FeedSource;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval: Duration,
    pub batch_size: usize,
}

/// Spawn a scheduler that runs one ingest cycle per tick, the first immediately.
/// Sink failures are logged; the loop keeps going.
pub fn spawn_scheduler<S: ArticleSink + ?Sized + 'static>(
    cfg: IngestSchedulerCfg,
    sources: Vec<FeedSource>,
    coordinator: Arc<BatchCoordinator>,
    sink: Arc<S>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match crate::ingest::run_cycle(&coordinator, &sources, cfg.batch_size, sink.as_ref())
                .await
            {
                Ok(report) => tracing::debug!(
                    target: "ingest",
                    sources = report.sources,
                    accepted = report.accepted,
                    "scheduled ingest tick"
                ),
                Err(e) => {
                    counter!("ingest_sink_errors_total").increment(1);
                    tracing::error!(target: "ingest", error = ?e, "scheduled ingest tick failed");
                }
            }
        }
    })
}
