// src/ingest/feed.rs
//! RSS 2.0 / RSS 1.0 (RDF) / Atom document model.
//!
//! The body is walked once with `quick_xml::Reader`. Entry fields are matched
//! on their qualified names, so `media:title`, `itunes:title` or
//! `media:description` never shadow the plain element of the same local name.
//! Text nodes are entity-decoded with `html_escape`, which also knows the HTML
//! named entities (`&eacute;`, `&copy;`, ...) that feeds emit but XML lacks.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::ingest::error::FetchError;

/// Feed-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: Option<String>,
}

/// Entry timestamp as it appeared in the document, tagged with its dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    /// RSS `pubDate`
    Rfc2822(String),
    /// Atom `published`/`updated`, RDF `dc:date`
    Rfc3339(String),
}

/// One item of a feed, before normalization.
///
/// `content`, `summary` and `description` hold markup as the feed carried it
/// (CDATA verbatim, escaped text decoded once).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub published: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    pub meta: FeedMeta,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Rss,
    Rdf,
    Atom,
}

impl Dialect {
    fn from_root(local: &[u8]) -> Result<Self, FetchError> {
        match local {
            b"rss" => Ok(Dialect::Rss),
            b"RDF" => Ok(Dialect::Rdf),
            b"feed" => Ok(Dialect::Atom),
            other => Err(FetchError::Parse(format!(
                "unsupported root element <{}>",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    fn entry_tag(self) -> &'static str {
        match self {
            Dialect::Atom => "entry",
            Dialect::Rss | Dialect::Rdf => "item",
        }
    }
}

#[derive(Debug)]
struct AtomLink {
    href: Option<String>,
    rel: Option<String>,
}

/// Fields collected between an entry's open and close tags.
#[derive(Debug, Default)]
struct PendingEntry {
    entry: FeedEntry,
    pub_date: Option<String>,
    dc_date: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    atom_links: Vec<AtomLink>,
}

impl PendingEntry {
    fn finish(mut self, dialect: Dialect) -> FeedEntry {
        self.entry.published = match dialect {
            Dialect::Atom => self.published.or(self.updated).map(RawTimestamp::Rfc3339),
            Dialect::Rss | Dialect::Rdf => match (self.pub_date, self.dc_date) {
                (Some(p), _) => Some(RawTimestamp::Rfc2822(p)),
                (None, Some(d)) => Some(RawTimestamp::Rfc3339(d)),
                (None, None) => None,
            },
        };
        if dialect == Dialect::Atom {
            self.entry.link = pick_atom_link(&self.atom_links);
        }
        self.entry
    }
}

/// Prefer `rel="alternate"` (or no rel), else the first link with an href.
fn pick_atom_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| l.href.is_some() && l.rel.as_deref().map_or(true, |r| r == "alternate"))
        .or_else(|| links.iter().find(|l| l.href.is_some()))
        .and_then(|l| l.href.clone())
}

fn xml_err(e: quick_xml::Error) -> FetchError {
    FetchError::Parse(e.to_string())
}

fn truncated() -> FetchError {
    FetchError::Parse("unexpected end of document".into())
}

fn utf8(bytes: &[u8]) -> Result<&str, FetchError> {
    std::str::from_utf8(bytes).map_err(|e| FetchError::Parse(e.to_string()))
}

fn attr(e: &BytesStart, name: &str) -> Result<Option<String>, FetchError> {
    let found = e
        .try_get_attribute(name)
        .map_err(|err| FetchError::Parse(err.to_string()))?;
    match found {
        Some(a) => Ok(Some(
            html_escape::decode_html_entities(utf8(&a.value)?).into_owned(),
        )),
        None => Ok(None),
    }
}

struct FeedParser<'a> {
    reader: Reader<&'a [u8]>,
    dialect: Dialect,
    root_prefix: Option<Vec<u8>>,
}

impl<'a> FeedParser<'a> {
    /// Qualified name, except that Atom elements sharing the root's prefix
    /// (`<atom:feed>`…`<atom:entry>`) are keyed by local name.
    fn key(&self, name: QName) -> String {
        let bytes = match (self.dialect, name.prefix()) {
            (Dialect::Atom, Some(p)) if self.root_prefix.as_deref() == Some(p.as_ref()) => {
                name.local_name().as_ref().to_vec()
            }
            _ => name.as_ref().to_vec(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn at_feed_level(&self, path: &[String]) -> bool {
        match self.dialect {
            Dialect::Atom => path.is_empty(),
            Dialect::Rss | Dialect::Rdf => path.len() == 1 && path[0] == "channel",
        }
    }

    /// Text of the element just opened, through its end tag. Nested markup is
    /// dropped and its text kept; Atom `type="xhtml"` keeps the inner markup.
    fn read_text_of(&mut self, start: &BytesStart) -> Result<String, FetchError> {
        if self.dialect == Dialect::Atom && attr(start, "type")?.as_deref() == Some("xhtml") {
            let inner = self.reader.read_text(start.name()).map_err(xml_err)?;
            return Ok(inner.trim().to_string());
        }

        let mut out = String::new();
        let mut depth = 0usize;
        loop {
            match self.reader.read_event().map_err(xml_err)? {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => break,
                Event::End(_) => depth -= 1,
                Event::Text(t) => out.push_str(&html_escape::decode_html_entities(utf8(&t)?)),
                Event::CData(c) => out.push_str(utf8(&c)?),
                Event::Eof => return Err(truncated()),
                _ => {}
            }
        }
        Ok(out.trim().to_string())
    }

    /// Fill one entry field from a direct child element. Returns false when
    /// the element is not a field of this dialect (the caller walks into it).
    fn entry_field(
        &mut self,
        pending: &mut PendingEntry,
        e: &BytesStart,
        key: &str,
        empty: bool,
    ) -> Result<bool, FetchError> {
        let slot = match (self.dialect, key) {
            (Dialect::Atom, "link") => {
                pending.atom_links.push(AtomLink {
                    href: attr(e, "href")?,
                    rel: attr(e, "rel")?,
                });
                if !empty {
                    self.reader.read_to_end(e.name()).map_err(xml_err)?;
                }
                return Ok(true);
            }
            (Dialect::Atom, "title") => &mut pending.entry.title,
            (Dialect::Atom, "content") => &mut pending.entry.content,
            (Dialect::Atom, "summary") => &mut pending.entry.summary,
            (Dialect::Atom, "published") => &mut pending.published,
            (Dialect::Atom, "updated") => &mut pending.updated,
            (Dialect::Atom, _) => return Ok(false),
            (_, "title") => &mut pending.entry.title,
            (_, "link") => &mut pending.entry.link,
            (_, "description") => &mut pending.entry.description,
            (_, "content:encoded") => &mut pending.entry.content,
            (_, "pubDate") => &mut pending.pub_date,
            (_, "dc:date") => &mut pending.dc_date,
            _ => return Ok(false),
        };

        let value = if empty {
            String::new()
        } else {
            self.read_text_of(e)?
        };
        // first occurrence wins; a blank RSS link leaves room for a later one
        if slot.is_none() && !(key == "link" && value.is_empty()) {
            *slot = Some(value);
        }
        Ok(true)
    }

    fn walk(mut self) -> Result<FeedDocument, FetchError> {
        let mut doc = FeedDocument::default();
        // open elements below the root
        let mut path: Vec<String> = Vec::new();
        // entry being filled, with the path depth of its direct children
        let mut pending: Option<(usize, PendingEntry)> = None;
        let mut saw_channel = false;

        loop {
            match self.reader.read_event().map_err(xml_err)? {
                Event::Start(e) => {
                    let key = self.key(e.name());
                    match pending.as_mut() {
                        Some((level, entry)) => {
                            if path.len() == *level && self.entry_field(entry, &e, &key, false)? {
                                continue;
                            }
                        }
                        None if key == self.dialect.entry_tag() => {
                            path.push(key);
                            pending = Some((path.len(), PendingEntry::default()));
                            continue;
                        }
                        None if key == "title"
                            && doc.meta.title.is_none()
                            && self.at_feed_level(&path) =>
                        {
                            doc.meta.title = Some(self.read_text_of(&e)?);
                            continue;
                        }
                        None => {}
                    }
                    if key == "channel" {
                        saw_channel = true;
                    }
                    path.push(key);
                }
                Event::Empty(e) => {
                    let key = self.key(e.name());
                    match pending.as_mut() {
                        Some((level, entry)) if path.len() == *level => {
                            self.entry_field(entry, &e, &key, true)?;
                        }
                        Some(_) => {}
                        None if key == self.dialect.entry_tag() => {
                            doc.entries.push(PendingEntry::default().finish(self.dialect));
                        }
                        None => saw_channel |= key == "channel",
                    }
                }
                Event::End(_) => {
                    if path.pop().is_none() {
                        // root closed
                        break;
                    }
                    if pending.as_ref().is_some_and(|(level, _)| path.len() < *level) {
                        if let Some((_, entry)) = pending.take() {
                            doc.entries.push(entry.finish(self.dialect));
                        }
                    }
                }
                Event::Eof => return Err(truncated()),
                _ => {}
            }
        }

        if self.dialect == Dialect::Rss && !saw_channel {
            return Err(FetchError::Parse("rss document without <channel>".into()));
        }
        Ok(doc)
    }
}

/// Parse an RSS, RDF or Atom body into a [`FeedDocument`].
///
/// Elements the model does not know about are skipped, whatever their
/// namespace. A document that is not well-formed, or whose root is none of
/// `rss`, `RDF` or `feed`, is a [`FetchError::Parse`].
pub fn parse_feed(body: &str) -> Result<FeedDocument, FetchError> {
    let mut reader = Reader::from_str(body);
    let root = loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => break e,
            Event::Empty(e) => {
                return match Dialect::from_root(e.local_name().as_ref())? {
                    Dialect::Rss => Err(FetchError::Parse("rss document without <channel>".into())),
                    Dialect::Rdf | Dialect::Atom => Ok(FeedDocument::default()),
                };
            }
            Event::Eof => return Err(FetchError::Parse("empty document".into())),
            _ => continue,
        }
    };

    let dialect = Dialect::from_root(root.local_name().as_ref())?;
    let root_prefix = root.name().prefix().map(|p| p.as_ref().to_vec());
    FeedParser {
        reader,
        dialect,
        root_prefix,
    }
    .walk()
}
