// src/storage/anchor_log.rs
//! Append-only Anchor Log.
//!
//! The local system-of-record for anchors: a JSON Lines file with one
//! `AnchorEntry` per line. Entries are never deleted or rewritten, which is
//! what makes the log tamper-evident in degraded (non-ledger) mode.
//!
//! Appends are a single durable write (open-append, write one line, flush),
//! so concurrent writers cannot corrupt each other and a returned `append`
//! is visible to every subsequent `exists`/`find` on the same backend.

use crate::error::StorageError;
use crate::models::anchor::AnchorEntry;
use async_trait::async_trait;
use log::warn;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Contract of the Anchor Log.
///
/// `StorageError` from any method means "could not consult the log", never
/// "the hash is absent"; callers must not conflate the two.
#[async_trait]
pub trait AnchorLog: Send + Sync {
    /// Appends one entry. Durable before returning.
    async fn append(&self, entry: &AnchorEntry) -> Result<(), StorageError>;

    /// Returns the first entry recorded for `hash`, if any.
    async fn find(&self, hash: &str) -> Result<Option<AnchorEntry>, StorageError>;

    /// Whether at least one entry exists for `hash`.
    async fn exists(&self, hash: &str) -> Result<bool, StorageError> {
        Ok(self.find(hash).await?.is_some())
    }

    /// Full current contents, oldest first. Re-iterating re-reads the log.
    /// Administrative browsing only.
    async fn list_all(&self) -> Result<Vec<AnchorEntry>, StorageError>;
}

/// File-backed Anchor Log (JSON Lines, one entry per line).
#[derive(Debug, Clone)]
pub struct FileAnchorLog {
    path: PathBuf,
}

impl FileAnchorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_entries(&self) -> Result<Vec<AnchorEntry>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AnchorEntry>(line) {
                Ok(entry) => entries.push(entry),
                // A malformed line is evidence of tampering or a torn write;
                // surface it to operators but keep serving intact entries.
                Err(e) => warn!("skipping malformed anchor log line: {}", e),
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl AnchorLog for FileAnchorLog {
    async fn append(&self, entry: &AnchorEntry) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut json = serde_json::to_string(entry)?;
        json.push('\n');
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn find(&self, hash: &str) -> Result<Option<AnchorEntry>, StorageError> {
        let entries = self.read_entries().await?;
        Ok(entries.into_iter().find(|entry| entry.hash == hash))
    }

    async fn list_all(&self) -> Result<Vec<AnchorEntry>, StorageError> {
        self.read_entries().await
    }
}
