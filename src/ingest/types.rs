// src/ingest/types.rs
use chrono::{DateTime, Utc};
use std::fmt;

/// Canonical article record produced by the pipeline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub content: String, // plain text, tags stripped
    pub url: String,
    pub published: DateTime<Utc>,
    pub source: String, // feed title, or the feed URL
}

/// One configured feed, addressed by URL. Opaque beyond that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FeedSource(String);

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FeedSource {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FeedSource {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
