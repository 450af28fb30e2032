// src/ingest/normalize.rs
use chrono::{DateTime, Utc};

use crate::ingest::feed::{FeedEntry, FeedMeta, RawTimestamp};
use crate::ingest::types::Article;

/// Build the canonical [`Article`] for an entry that already passed filtering.
pub fn normalize_entry(
    entry: &FeedEntry,
    meta: &FeedMeta,
    content: String,
    source_url: &str,
) -> Article {
    let source = meta
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(source_url)
        .to_string();

    Article {
        title: entry.title.clone().unwrap_or_default(),
        content,
        url: entry.link.clone().unwrap_or_default(),
        published: parse_published(entry, Utc::now()),
        source,
    }
}

/// Entry timestamp in UTC, or `now` when it is missing or unparseable.
pub fn parse_published(entry: &FeedEntry, now: DateTime<Utc>) -> DateTime<Utc> {
    entry
        .published
        .as_ref()
        .and_then(parse_raw_timestamp)
        .unwrap_or(now)
}

fn parse_raw_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    let parsed = match raw {
        RawTimestamp::Rfc2822(s) => DateTime::parse_from_rfc2822(s.trim()),
        RawTimestamp::Rfc3339(s) => DateTime::parse_from_rfc3339(s.trim()),
    };
    parsed.ok().map(|dt| dt.with_timezone(&Utc))
}
