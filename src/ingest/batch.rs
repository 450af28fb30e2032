// src/ingest/batch.rs
use futures::future::join_all;
use std::time::Duration;
use tracing::debug;

use crate::ingest::fetcher::SourceFetcher;
use crate::ingest::types::{Article, FeedSource};

/// Fetches sources in fixed-size concurrent batches, pausing between batches.
pub struct BatchCoordinator {
    fetcher: SourceFetcher,
    batch_delay: Duration,
}

impl BatchCoordinator {
    pub fn new(fetcher: SourceFetcher, batch_delay: Duration) -> Self {
        Self {
            fetcher,
            batch_delay,
        }
    }

    pub fn fetcher(&self) -> &SourceFetcher {
        &self.fetcher
    }

    /// Articles from every source, in source order then entry order.
    /// A `batch_size` of 0 is treated as 1.
    pub async fn fetch_all(&self, sources: &[FeedSource], batch_size: usize) -> Vec<Article> {
        let batch_size = batch_size.max(1);
        let batches = sources.len().div_ceil(batch_size);
        let mut articles = Vec::new();

        for (i, batch) in sources.chunks(batch_size).enumerate() {
            debug!(target: "ingest", batch = i + 1, of = batches, size = batch.len(), "fetching batch");

            // join_all yields results in input order, whatever the completion order.
            let results = join_all(batch.iter().map(|s| self.fetcher.fetch_source(s))).await;
            for mut found in results {
                articles.append(&mut found);
            }

            if i + 1 < batches {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        articles
    }
}
