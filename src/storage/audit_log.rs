// src/storage/audit_log.rs
//! Verification audit trail.
//!
//! Every verification attempt against a known certificate is recorded here,
//! regardless of outcome. Records are never mutated or deleted; the history
//! endpoint reads them back for dashboards. Same JSON Lines layout as the
//! Anchor Log.

use crate::error::StorageError;
use crate::models::anchor::VerificationRecord;
use async_trait::async_trait;
use log::warn;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Append-only store of verification attempts.
#[async_trait]
pub trait VerificationLog: Send + Sync {
    async fn append(&self, record: &VerificationRecord) -> Result<(), StorageError>;

    /// Full history, oldest first.
    async fn list_all(&self) -> Result<Vec<VerificationRecord>, StorageError>;
}

/// File-backed verification log (JSON Lines).
#[derive(Debug, Clone)]
pub struct FileVerificationLog {
    path: PathBuf,
}

impl FileVerificationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VerificationLog for FileVerificationLog {
    async fn append(&self, record: &VerificationRecord) -> Result<(), StorageError> {
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

        let mut json = serde_json::to_string(record)?;
        json.push('\n');
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<VerificationRecord>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let mut records = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<VerificationRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping malformed verification log line: {}", e),
            }
        }
        Ok(records)
    }
}
