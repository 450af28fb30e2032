// src/ingest/transport.rs
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::ingest::error::FetchError;

/// Fetches the raw body of a feed URL.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Non-2xx answers must surface as [`FetchError::Status`].
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed transport used in production.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("feed-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self::from_client(client, timeout))
    }

    /// Wrap a caller-built client. `timeout` is what a timed-out request
    /// reports in [`FetchError::Timeout`]; the client enforces it.
    pub fn from_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let timeout = self.timeout;
        let classify = move |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::Transport(e)
            }
        };

        let resp = self.client.get(url).send().await.map_err(classify)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        resp.text().await.map_err(classify)
    }
}

/// Canned answer for one URL of a [`FixtureTransport`].
#[derive(Debug, Clone)]
pub enum FixtureResponse {
    Body(String),
    Status(u16),
    Unreachable,
    /// Never answers; only a deadline ends the request.
    Hang,
}

/// In-memory transport for offline runs and tests. Unknown URLs are unreachable.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    responses: HashMap<String, FixtureResponse>,
    latency: Duration,
    requests: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses
            .insert(url.to_string(), FixtureResponse::Body(body.into()));
        self
    }

    pub fn with_response(mut self, url: &str, response: FixtureResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Delay applied to every answered request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// URLs requested so far, with the (tokio) instant each request started.
    pub fn requests(&self) -> Vec<(String, tokio::time::Instant)> {
        self.requests
            .lock()
            .expect("fixture request log poisoned")
            .clone()
    }
}

#[async_trait]
impl FeedTransport for FixtureTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.requests
            .lock()
            .expect("fixture request log poisoned")
            .push((url.to_string(), tokio::time::Instant::now()));

        let response = self.responses.get(url).cloned();
        let hangs = matches!(response, Some(FixtureResponse::Hang));
        if !hangs && !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match response {
            Some(FixtureResponse::Body(body)) => Ok(body),
            Some(FixtureResponse::Status(code)) => Err(FetchError::Status(code)),
            Some(FixtureResponse::Hang) => std::future::pending().await,
            Some(FixtureResponse::Unreachable) | None => {
                Err(FetchError::Unreachable(format!("no route to {url}")))
            }
        }
    }
}
