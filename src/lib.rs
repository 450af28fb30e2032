// Public library surface for the binary and integration tests.

pub mod ingest;

// ---- Re-exports for stable public API ----
pub use crate::ingest::batch::BatchCoordinator;
pub use crate::ingest::config::IngestConfig;
pub use crate::ingest::dedup::{DedupGate, Fingerprint, SeenStore};
pub use crate::ingest::fetcher::{FetchLimits, SourceFetcher};
pub use crate::ingest::types::{Article, FeedSource};
pub use crate::ingest::{run_cycle, CycleReport};
