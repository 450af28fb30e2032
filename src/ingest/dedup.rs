// src/ingest/dedup.rs
//! Content-fingerprint dedup gate.
//!
//! The gate owns no state of its own: "seen" lives behind the [`SeenStore`]
//! capability, which outlives a single cycle and is shared by every
//! concurrent fetch. Stores must make `insert_if_absent` atomic so that two
//! sources racing on identical content cannot both record it as new.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// SHA-256 of the article body. Only ever compared, never decoded.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut out).ok()?;
        Some(Self(out))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

#[async_trait]
pub trait SeenStore: Send + Sync {
    async fn contains(&self, fp: &Fingerprint) -> Result<bool>;
    /// Returns `true` only if this call inserted `fp`.
    async fn insert_if_absent(&self, fp: Fingerprint) -> Result<bool>;
}

/// Process-local store; also the test double.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    seen: Mutex<HashSet<Fingerprint>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().expect("seen-store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn contains(&self, fp: &Fingerprint) -> Result<bool> {
        Ok(self.seen.lock().expect("seen-store mutex poisoned").contains(fp))
    }

    async fn insert_if_absent(&self, fp: Fingerprint) -> Result<bool> {
        Ok(self.seen.lock().expect("seen-store mutex poisoned").insert(fp))
    }
}

/// Append-only text file of hex fingerprints, one per line, mirrored in memory.
#[derive(Debug)]
pub struct FileSeenStore {
    path: PathBuf,
    seen: Mutex<HashSet<Fingerprint>>,
    append: tokio::sync::Mutex<()>,
}

impl FileSeenStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut seen = HashSet::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                for (lineno, line) in text.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match Fingerprint::from_hex(line) {
                        Some(fp) => {
                            seen.insert(fp);
                        }
                        None => warn!(
                            target: "ingest",
                            path = %path.display(),
                            line = lineno + 1,
                            "ignoring malformed fingerprint line"
                        ),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("reading seen store {}", path.display()))
            }
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        Ok(Self {
            path,
            seen: Mutex::new(seen),
            append: tokio::sync::Mutex::new(()),
        })
    }

    pub fn len(&self) -> usize {
        self.seen.lock().expect("seen-store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SeenStore for FileSeenStore {
    async fn contains(&self, fp: &Fingerprint) -> Result<bool> {
        Ok(self.seen.lock().expect("seen-store mutex poisoned").contains(fp))
    }

    async fn insert_if_absent(&self, fp: Fingerprint) -> Result<bool> {
        let inserted = self.seen.lock().expect("seen-store mutex poisoned").insert(fp);
        if !inserted {
            return Ok(false);
        }

        let _guard = self.append.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening seen store {}", self.path.display()))?;
        file.write_all(format!("{fp}\n").as_bytes())
            .await
            .with_context(|| format!("appending to seen store {}", self.path.display()))?;
        Ok(true)
    }
}

/// Accept/record front of the seen store.
#[derive(Clone)]
pub struct DedupGate {
    store: Arc<dyn SeenStore>,
}

impl DedupGate {
    pub fn new(store: Arc<dyn SeenStore>) -> Self {
        Self { store }
    }

    pub fn fingerprint(content: &str) -> Fingerprint {
        Fingerprint::of(content)
    }

    /// A store fault counts as "not seen" so content is never lost to it.
    pub async fn is_duplicate(&self, fp: &Fingerprint) -> bool {
        match self.store.contains(fp).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!(target: "ingest", error = ?e, %fp, "seen-store lookup failed");
                false
            }
        }
    }

    /// Mark `fp` as seen. `false` means somebody recorded it first.
    pub async fn record(&self, fp: Fingerprint) -> bool {
        match self.store.insert_if_absent(fp).await {
            Ok(inserted) => inserted,
            Err(e) => {
                warn!(target: "ingest", error = ?e, %fp, "seen-store insert failed");
                true
            }
        }
    }
}
