// src/ingest/extract.rs
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::feed::FeedEntry;

/// Plain-text body of an entry.
///
/// Field precedence is content, then summary, then description. The first
/// field that is present wins even when it is empty; fields are never merged.
/// Tags are stripped, then HTML entities decoded (`&nbsp;` becomes a space).
pub fn extract_content(entry: &FeedEntry) -> String {
    let raw = entry
        .content
        .as_deref()
        .or(entry.summary.as_deref())
        .or(entry.description.as_deref())
        .unwrap_or_default();
    html_escape::decode_html_entities(&strip_tags(raw))
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// Remove every `<...>` tag and trim surrounding whitespace.
pub fn strip_tags(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex"));
    re_tags.replace_all(s, "").trim().to_string()
}
