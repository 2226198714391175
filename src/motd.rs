//! Concurrency-safe MOTD store backed by a JSON snapshot on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

/// Durable form of the current message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotdSnapshot {
    pub message: String,
    pub last_updated: i64,
}

#[derive(Debug)]
struct Inner {
    message: String,
    last_updated: i64,
}

/// Holder of the current message of the day.
///
/// All access goes through a single async mutex, so `set` updates the
/// in-memory pair and the on-disk snapshot without interleaving with other
/// writers, and `get` never observes a torn message/timestamp pair. Instances
/// are injected through the shared app context; there is no global.
#[derive(Debug)]
pub struct MotdStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl MotdStore {
    /// Load the store from `path`, falling back to `default_message` when no
    /// snapshot exists yet or the existing one cannot be read.
    pub async fn load(path: impl Into<PathBuf>, default_message: &str) -> Self {
        let path = path.into();
        let inner = match read_snapshot(&path).await {
            Ok(Some(snapshot)) => Inner {
                message: snapshot.message,
                last_updated: snapshot.last_updated,
            },
            Ok(None) => Inner {
                message: default_message.to_string(),
                last_updated: chrono::Utc::now().timestamp(),
            },
            Err(e) => {
                warn!("Failed to read MOTD snapshot, using default: {e:#}");
                Inner {
                    message: default_message.to_string(),
                    last_updated: chrono::Utc::now().timestamp(),
                }
            }
        };

        Self {
            path,
            inner: Mutex::new(inner),
        }
    }

    /// Current `(message, last_updated)` pair.
    pub async fn get(&self) -> (String, i64) {
        let inner = self.inner.lock().await;
        (inner.message.clone(), inner.last_updated)
    }

    /// Replace the message and persist the new snapshot.
    ///
    /// The in-memory update happens before persistence. If the write fails
    /// the two diverge until the next successful `set` or a restart reloads
    /// the stale file; the error is returned so the caller can surface it.
    pub async fn set(&self, message: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.message = message.to_string();
        // max() keeps last_updated monotonically non-decreasing even if the
        // wall clock steps backwards between calls.
        inner.last_updated = inner.last_updated.max(chrono::Utc::now().timestamp());

        let snapshot = MotdSnapshot {
            message: inner.message.clone(),
            last_updated: inner.last_updated,
        };
        write_snapshot(&self.path, &snapshot).await
    }
}

async fn read_snapshot(path: &Path) -> Result<Option<MotdSnapshot>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let snapshot = serde_json::from_str(&text).context("Failed to parse MOTD snapshot")?;
            Ok(Some(snapshot))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("Failed to read MOTD snapshot"),
    }
}

async fn write_snapshot(path: &Path, snapshot: &MotdSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create MOTD directory: {}", parent.display()))?;
    }

    let text = serde_json::to_string(snapshot).context("Failed to serialize MOTD snapshot")?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Failed to write MOTD snapshot: {}", path.display()))
}
