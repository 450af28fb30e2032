// tests/ingest_scenarios.rs
use feed_ingest::ingest::dedup::MemorySeenStore;
use feed_ingest::ingest::transport::FixtureTransport;
use feed_ingest::{BatchCoordinator, DedupGate, FeedSource, FetchLimits, SourceFetcher};
use std::sync::Arc;
use std::time::Duration;

fn rss(title: &str, bodies: &[String]) -> String {
    let mut xml = format!("<rss version=\"2.0\"><channel><title>{title}</title>");
    for (i, body) in bodies.iter().enumerate() {
        xml.push_str(&format!(
            "<item><title>{title} #{i}</title><link>https://{title}.test/{i}</link><description>{body}</description></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

fn coordinator(transport: Arc<FixtureTransport>, max: usize, min: usize) -> BatchCoordinator {
    let fetcher = SourceFetcher::new(
        transport,
        DedupGate::new(Arc::new(MemorySeenStore::new())),
        FetchLimits {
            max_articles_per_feed: max,
            min_article_length: min,
            request_timeout: Duration::from_secs(60),
        },
    );
    BatchCoordinator::new(fetcher, Duration::from_millis(500))
}

#[tokio::test]
async fn short_first_entry_is_skipped() {
    let bodies = vec!["a".repeat(50), "b".repeat(300), "c".repeat(300)];
    let url = "https://short.test/rss";
    let t = Arc::new(FixtureTransport::new().with_body(url, rss("short", &bodies)));
    let c = coordinator(t, 10, 100);

    let out = c.fetch_all(&[FeedSource::from(url)], 5).await;
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].content, bodies[1]);
    assert_eq!(out[1].content, bodies[2]);
}

#[tokio::test]
async fn identical_content_across_sources_is_accepted_once() {
    let same = vec!["Hello world, this is a test article with enough length.".to_string()];
    let t = Arc::new(
        FixtureTransport::new()
            .with_body("https://one.test/rss", rss("one", &same))
            .with_body("https://two.test/rss", rss("two", &same)),
    );
    let c = coordinator(t, 10, 20);

    let sources = vec![
        FeedSource::from("https://one.test/rss"),
        FeedSource::from("https://two.test/rss"),
    ];
    let out = c.fetch_all(&sources, 5).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].source, "one");
}

#[tokio::test]
async fn cap_keeps_the_first_entries_in_document_order() {
    let bodies: Vec<String> = (0..5).map(|i| format!("qualifying body number {i}")).collect();
    let url = "https://capped.test/rss";
    let t = Arc::new(FixtureTransport::new().with_body(url, rss("capped", &bodies)));
    let c = coordinator(t, 2, 10);

    let out = c.fetch_all(&[FeedSource::from(url)], 5).await;
    let titles: Vec<&str> = out.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["capped #0", "capped #1"]);
}

#[tokio::test]
async fn short_entries_do_not_count_against_the_cap() {
    let bodies = vec![
        "tiny".to_string(),
        "long enough body one".to_string(),
        "tiny2".to_string(),
        "long enough body two".to_string(),
        "long enough body three".to_string(),
    ];
    let url = "https://mixed.test/rss";
    let t = Arc::new(FixtureTransport::new().with_body(url, rss("mixed", &bodies)));
    let c = coordinator(t, 2, 10);

    let out = c.fetch_all(&[FeedSource::from(url)], 5).await;
    let contents: Vec<&str> = out.iter().map(|a| a.content.as_str()).collect();
    assert_eq!(contents, vec!["long enough body one", "long enough body two"]);
}

#[tokio::test(start_paused = true)]
async fn seven_sources_run_as_five_then_two_with_one_pause() {
    let mut t = FixtureTransport::new();
    let mut sources = Vec::new();
    for i in 0..7 {
        let url = format!("https://s{i}.test/rss");
        t = t.with_body(&url, rss(&format!("s{i}"), &[format!("article body from source {i}")]));
        sources.push(FeedSource::from(url));
    }
    let t = Arc::new(t);
    let c = coordinator(t.clone(), 10, 10);

    let start = tokio::time::Instant::now();
    let out = c.fetch_all(&sources, 5).await;
    let elapsed = start.elapsed();

    // Output follows the 7-source order
    let names: Vec<&str> = out.iter().map(|a| a.source.as_str()).collect();
    assert_eq!(names, vec!["s0", "s1", "s2", "s3", "s4", "s5", "s6"]);

    // Exactly one 500 ms pause, between the batches
    assert_eq!(elapsed, Duration::from_millis(500));

    let requests = t.requests();
    assert_eq!(requests.len(), 7);
    for (url, at) in &requests[..5] {
        assert_eq!(*at, start, "{url} should be in the first batch");
    }
    for (url, at) in &requests[5..] {
        assert_eq!(
            *at,
            start + Duration::from_millis(500),
            "{url} should start after the pause"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn no_pause_after_the_final_batch() {
    let mut t = FixtureTransport::new();
    let mut sources = Vec::new();
    for i in 0..5 {
        let url = format!("https://full{i}.test/rss");
        t = t.with_body(&url, rss("full", &[format!("article body number {i}")]));
        sources.push(FeedSource::from(url));
    }
    let c = coordinator(Arc::new(t), 10, 10);

    let start = tokio::time::Instant::now();
    let out = c.fetch_all(&sources, 5).await;
    assert_eq!(out.len(), 5);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn sources_within_a_batch_are_fetched_concurrently() {
    let mut t = FixtureTransport::new().with_latency(Duration::from_secs(1));
    let mut sources = Vec::new();
    for i in 0..4 {
        let url = format!("https://slow{i}.test/rss");
        t = t.with_body(&url, rss(&format!("slow{i}"), &[format!("slow article body {i}")]));
        sources.push(FeedSource::from(url));
    }
    let c = coordinator(Arc::new(t), 10, 10);

    let start = tokio::time::Instant::now();
    let out = c.fetch_all(&sources, 4).await;
    assert_eq!(out.len(), 4);
    // Four one-second fetches overlap into one second
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test]
async fn zero_batch_size_behaves_like_one() {
    let t = Arc::new(
        FixtureTransport::new()
            .with_body("https://a.test/rss", rss("a", &["body from source a".to_string()]))
            .with_body("https://b.test/rss", rss("b", &["body from source b".to_string()])),
    );
    let c = BatchCoordinator::new(
        SourceFetcher::new(
            t,
            DedupGate::new(Arc::new(MemorySeenStore::new())),
            FetchLimits {
                min_article_length: 5,
                ..FetchLimits::default()
            },
        ),
        Duration::ZERO,
    );
    let sources = vec![
        FeedSource::from("https://a.test/rss"),
        FeedSource::from("https://b.test/rss"),
    ];
    let out = c.fetch_all(&sources, 0).await;
    let names: Vec<&str> = out.iter().map(|a| a.source.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}
