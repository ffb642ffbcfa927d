// src/storage/record_store.rs
//! Certificate Record Store access.
//!
//! The record store is an external collaborator; the core consumes it
//! through the `CertificateStore` trait and only relies on its read/write
//! contract: `insert` and `get_by_hash` are atomic and immediately
//! consistent, and lookups always return a defined `Option` (no
//! "maybe array" ambiguity at the boundary).
//!
//! The in-memory implementation backs tests and single-node deployments.

use crate::error::StorageError;
use crate::models::certificate::{CertificateRecord, NewCertificate};
#[cfg(test)]
use crate::utils::commitment::CertificateFields;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Read/write contract of the Certificate Record Store.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Inserts a certificate, assigning its id. Fails on a duplicate hash:
    /// `certificate_hash` is unique and immutable once assigned.
    async fn insert(&self, certificate: NewCertificate) -> Result<CertificateRecord, StorageError>;

    /// Looks up a certificate by its content hash.
    async fn get_by_hash(&self, hash: &str) -> Result<Option<CertificateRecord>, StorageError>;
}

struct Inner {
    by_hash: HashMap<String, CertificateRecord>,
    next_id: i64,
}

/// In-memory certificate store (hash-keyed, `RwLock`-guarded).
pub struct InMemoryCertificateStore {
    inner: RwLock<Inner>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                by_hash: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Overwrites the stored fields of a certificate without touching its
    /// hash. This deliberately violates the hash/fields invariant; it exists
    /// so tests can simulate record-store corruption.
    #[cfg(test)]
    pub fn corrupt_fields(&self, hash: &str, fields: CertificateFields) {
        let mut inner = self.inner.write().expect("record store lock poisoned");
        if let Some(record) = inner.by_hash.get_mut(hash) {
            record.fields = fields;
        }
    }
}

impl Default for InMemoryCertificateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateStore for InMemoryCertificateStore {
    async fn insert(&self, certificate: NewCertificate) -> Result<CertificateRecord, StorageError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StorageError::Backend("record store lock poisoned".into()))?;

        if inner.by_hash.contains_key(&certificate.certificate_hash) {
            return Err(StorageError::Backend(format!(
                "duplicate certificate hash: {}",
                certificate.certificate_hash
            )));
        }

        let record = CertificateRecord {
            id: inner.next_id,
            student_ref: certificate.student_ref,
            issue_date: certificate.issue_date,
            fields: certificate.fields,
            certificate_hash: certificate.certificate_hash,
        };
        inner.next_id += 1;
        inner
            .by_hash
            .insert(record.certificate_hash.clone(), record.clone());
        Ok(record)
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Option<CertificateRecord>, StorageError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StorageError::Backend("record store lock poisoned".into()))?;
        Ok(inner.by_hash.get(hash).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_certificate(hash: &str) -> NewCertificate {
        let mut fields = CertificateFields::new();
        fields.insert("department".into(), "Computer Science".into());
        NewCertificate {
            student_ref: "student-1".into(),
            issue_date: Utc::now(),
            fields,
            certificate_hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryCertificateStore::new();
        let a = store.insert(new_certificate("hash-a")).await.unwrap();
        let b = store.insert(new_certificate("hash-b")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn test_get_by_hash() {
        let store = InMemoryCertificateStore::new();
        store.insert(new_certificate("hash-a")).await.unwrap();

        let found = store.get_by_hash("hash-a").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().student_ref, "student-1");
        assert!(store.get_by_hash("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_hash_rejected() {
        let store = InMemoryCertificateStore::new();
        store.insert(new_certificate("hash-a")).await.unwrap();
        assert!(store.insert(new_certificate("hash-a")).await.is_err());
    }
}
