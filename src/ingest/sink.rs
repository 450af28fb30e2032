// src/ingest/sink.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::ingest::types::Article;

/// Persistence collaborator that receives each cycle's accepted articles.
#[async_trait::async_trait]
pub trait ArticleSink: Send + Sync {
    async fn store(&self, articles: Vec<Article>) -> Result<()>;
}

/// Appends one JSON object per article to a file.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl ArticleSink for JsonlSink {
    async fn store(&self, articles: Vec<Article>) -> Result<()> {
        let mut buf = String::new();
        for a in &articles {
            buf.push_str(&serde_json::to_string(a).context("serializing article")?);
            buf.push('\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(buf.as_bytes())
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }
}

// --- Test helper ---
#[derive(Debug, Default)]
pub struct MemorySink {
    pub calls: std::sync::Mutex<Vec<Vec<Article>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored article, flattened in call order.
    pub fn articles(&self) -> Vec<Article> {
        self.calls
            .lock()
            .expect("memory sink poisoned")
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl ArticleSink for MemorySink {
    async fn store(&self, articles: Vec<Article>) -> Result<()> {
        self.calls.lock().expect("memory sink poisoned").push(articles);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(title: &str) -> Article {
        Article {
            title: title.into(),
            content: "body".into(),
            url: format!("https://feeds.test/{title}"),
            published: Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
            source: "Unit Feed".into(),
        }
    }

    #[tokio::test]
    async fn jsonl_sink_appends_one_line_per_article() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::new(dir.path().join("out").join("articles.jsonl"));

        sink.store(vec![article("a"), article("b")]).await.unwrap();
        sink.store(vec![article("c")]).await.unwrap();

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let parsed: Vec<Article> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let titles: Vec<&str> = parsed.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(parsed[0], article("a"));
    }
}
