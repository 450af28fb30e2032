// tests/ingest_pipeline.rs
use chrono::{TimeZone, Utc};
use feed_ingest::ingest::dedup::{FileSeenStore, MemorySeenStore};
use feed_ingest::ingest::sink::{JsonlSink, MemorySink};
use feed_ingest::ingest::transport::FixtureTransport;
use feed_ingest::{
    run_cycle, Article, BatchCoordinator, DedupGate, FeedSource, FetchLimits, SeenStore,
    SourceFetcher,
};
use std::sync::Arc;
use std::time::Duration;

const WIRE: &str = "https://wire.example.test/rss";
const LAB: &str = "https://lab.example.test/atom";
const WIRE_XML: &str = include_str!("fixtures/wire_rss.xml");
const LAB_XML: &str = include_str!("fixtures/lab_atom.xml");

fn coordinator(store: Arc<dyn SeenStore>) -> BatchCoordinator {
    let transport = FixtureTransport::new()
        .with_body(WIRE, WIRE_XML)
        .with_body(LAB, LAB_XML);
    let fetcher = SourceFetcher::new(
        Arc::new(transport),
        DedupGate::new(store),
        FetchLimits {
            max_articles_per_feed: 10,
            min_article_length: 60,
            request_timeout: Duration::from_secs(60),
        },
    );
    BatchCoordinator::new(fetcher, Duration::ZERO)
}

fn sources() -> Vec<FeedSource> {
    vec![FeedSource::from(WIRE), FeedSource::from(LAB)]
}

#[tokio::test]
async fn fixtures_flow_through_to_the_sink() {
    let c = coordinator(Arc::new(MemorySeenStore::new()));
    let sink = MemorySink::new();

    let before = Utc::now();
    let report = run_cycle(&c, &sources(), 5, &sink).await.expect("cycle ok");
    assert_eq!(report.sources, 2);
    assert_eq!(report.accepted, 4);

    let calls = sink.calls.lock().unwrap().len();
    assert_eq!(calls, 1, "one hand-off per cycle");

    let out: Vec<Article> = sink.articles();
    let titles: Vec<&str> = out.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Council approves new transit plan",
            "Storm season outlook",
            "Sequencing pipeline rewrite",
            "Untitled draft",
        ]
    );

    // RSS: content:encoded wins over description; markup and &nbsp; are gone
    assert_eq!(
        out[0].content,
        "The city council approved a twelve-year transit plan on Tuesday, adding three bus rapid lines and a light rail extension to the airport."
    );
    assert_eq!(out[0].source, "Example Wire");
    assert_eq!(out[0].url, "https://wire.example.test/transit");
    assert_eq!(
        out[0].published,
        Utc.with_ymd_and_hms(2025, 6, 10, 14, 30, 0).unwrap()
    );

    // Unparseable pubDate falls back to ingestion time
    assert!(out[1].content.starts_with("Forecasters expect"));
    assert!(out[1].content.contains("temperatures & weaker"));
    assert!(out[1].published >= before);

    // Atom: content beats summary, alternate link, published beats updated
    assert!(out[2].content.starts_with("We rewrote the sequencing pipeline"));
    assert_eq!(out[2].source, "Lab Notes");
    assert_eq!(out[2].url, "https://lab.example.test/sequencing");
    assert_eq!(
        out[2].published,
        Utc.with_ymd_and_hms(2025, 6, 9, 6, 0, 0).unwrap()
    );

    // Atom entry with only summary and updated, no link
    assert_eq!(out[3].url, "");
    assert_eq!(
        out[3].published,
        Utc.with_ymd_and_hms(2025, 6, 8, 17, 45, 0).unwrap()
    );
}

#[tokio::test]
async fn second_cycle_sees_everything_as_duplicate() {
    let c = coordinator(Arc::new(MemorySeenStore::new()));
    let sink = MemorySink::new();

    let first = run_cycle(&c, &sources(), 5, &sink).await.unwrap();
    let second = run_cycle(&c, &sources(), 5, &sink).await.unwrap();

    assert_eq!(first.accepted, 4);
    assert_eq!(second.accepted, 0);
    // Empty cycles do not call the sink
    assert_eq!(sink.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn file_store_dedups_across_process_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let seen = dir.path().join("seen.txt");
    let out = dir.path().join("articles.jsonl");

    {
        let store = Arc::new(FileSeenStore::open(&seen).await.unwrap());
        let c = coordinator(store);
        let report = run_cycle(&c, &sources(), 5, &JsonlSink::new(&out)).await.unwrap();
        assert_eq!(report.accepted, 4);
    }

    let store = Arc::new(FileSeenStore::open(&seen).await.unwrap());
    assert_eq!(store.len(), 4);
    let c = coordinator(store);
    let report = run_cycle(&c, &sources(), 5, &JsonlSink::new(&out)).await.unwrap();
    assert_eq!(report.accepted, 0);

    let lines = std::fs::read_to_string(&out).unwrap();
    assert_eq!(lines.lines().count(), 4);
}

#[tokio::test]
async fn media_and_itunes_siblings_still_yield_articles() {
    let url = "https://rss.news.test/World.xml";
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/"
     xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd"
     xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>World News</title>
    <item>
      <title>Harbor reopens after repairs</title>
      <itunes:title>Harbor episode</itunes:title>
      <link>https://news.test/harbor</link>
      <description>The harbor reopened to cargo traffic on Friday after a caf&eacute; fire damaged the pier.</description>
      <dc:creator>Staff</dc:creator>
      <media:title>Harbor photo</media:title>
      <media:description>Cranes at dawn.</media:description>
    </item>
  </channel>
</rss>"#;
    let fetcher = SourceFetcher::new(
        Arc::new(FixtureTransport::new().with_body(url, xml)),
        DedupGate::new(Arc::new(MemorySeenStore::new())),
        FetchLimits {
            max_articles_per_feed: 10,
            min_article_length: 60,
            request_timeout: Duration::from_secs(60),
        },
    );

    let out = fetcher.fetch_source(&FeedSource::from(url)).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].title, "Harbor reopens after repairs");
    assert_eq!(
        out[0].content,
        "The harbor reopened to cargo traffic on Friday after a café fire damaged the pier."
    );
}
