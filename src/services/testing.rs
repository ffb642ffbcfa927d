// src/services/testing.rs
//! Test doubles for the service layer: an in-process fake ledger and a
//! failure-injecting anchor log.

use crate::blockchain::ledger_client::{ConnectionState, LedgerClient};
use crate::error::{LedgerError, StorageError};
use crate::models::anchor::AnchorEntry;
use crate::storage::anchor_log::AnchorLog;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory ledger fake. Either permanently connected (anchors land in a
/// set that `check` consults) or permanently degraded (every call is
/// `LedgerError::Unavailable`).
pub struct FakeLedgerClient {
    degraded: AtomicBool,
    anchored: Mutex<HashSet<String>>,
}

impl FakeLedgerClient {
    pub fn connected() -> Self {
        Self {
            degraded: AtomicBool::new(false),
            anchored: Mutex::new(HashSet::new()),
        }
    }

    pub fn degraded() -> Self {
        Self {
            degraded: AtomicBool::new(true),
            anchored: Mutex::new(HashSet::new()),
        }
    }

    fn unavailable<T>(&self) -> Result<T, LedgerError> {
        Err(LedgerError::Unavailable("fake ledger is degraded".into()))
    }
}

#[async_trait]
impl LedgerClient for FakeLedgerClient {
    async fn connect(&self) -> ConnectionState {
        self.state()
    }

    fn state(&self) -> ConnectionState {
        if self.degraded.load(Ordering::SeqCst) {
            ConnectionState::Degraded
        } else {
            ConnectionState::Connected
        }
    }

    async fn anchor(&self, hash: &str) -> Result<String, LedgerError> {
        if self.degraded.load(Ordering::SeqCst) {
            return self.unavailable();
        }
        self.anchored
            .lock()
            .expect("fake ledger lock poisoned")
            .insert(hash.to_string());
        Ok(format!("0xfake{}", &hash[..16.min(hash.len())]))
    }

    async fn check(&self, hash: &str) -> Result<bool, LedgerError> {
        if self.degraded.load(Ordering::SeqCst) {
            return self.unavailable();
        }
        Ok(self
            .anchored
            .lock()
            .expect("fake ledger lock poisoned")
            .contains(hash))
    }

    fn reset(&self) {
        self.degraded.store(false, Ordering::SeqCst);
    }
}

/// Anchor log whose every operation fails with a storage error.
pub struct FailingAnchorLog;

#[async_trait]
impl AnchorLog for FailingAnchorLog {
    async fn append(&self, _entry: &AnchorEntry) -> Result<(), StorageError> {
        Err(StorageError::Backend("forced anchor log failure".into()))
    }

    async fn find(&self, _hash: &str) -> Result<Option<AnchorEntry>, StorageError> {
        Err(StorageError::Backend("forced anchor log failure".into()))
    }

    async fn list_all(&self) -> Result<Vec<AnchorEntry>, StorageError> {
        Err(StorageError::Backend("forced anchor log failure".into()))
    }
}
