// src/services/verification.rs
//! Verification Service.
//!
//! Answers "is this certificate authentic and unaltered?" for a given hash:
//! look up the record, recompute its commitment, consult the ledger (with
//! the local anchor log as fallback), and record the attempt for audit.
//!
//! The service never fabricates a verdict: when both anchor sources are
//! unavailable it fails with [`VerifyError::Unavailable`] instead of
//! defaulting to true or false.

use crate::blockchain::ledger_client::LedgerClient;
use crate::error::{LedgerError, StorageError, VerifyError};
use crate::models::anchor::{AnchorEntry, VerificationRecord};
use crate::models::certificate::CertificateRecord;
use crate::storage::anchor_log::AnchorLog;
use crate::storage::audit_log::VerificationLog;
use crate::storage::record_store::CertificateStore;
use crate::utils::commitment::{compute_commitment, compute_hash};
use crate::zkp::binding::{BindingCheck, BindingProofChecker};
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use std::sync::Arc;

/// Why a verification verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    /// Hash matches the record and an anchor exists.
    Anchored,
    /// Hash matches but no anchor was found in the consulted source.
    NotAnchored,
    /// No certificate with this hash is known.
    NotFound,
    /// The stored record's fields no longer hash to the certificate hash:
    /// corruption or tampering in the record store itself.
    HashMismatch,
}

/// Which anchor source produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSource {
    Ledger,
    LocalLog,
}

/// Outcome of one verification call.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub reason: VerdictReason,
    pub checked_at: DateTime<Utc>,
    /// Present when an anchor source was consulted successfully.
    pub anchor_source: Option<AnchorSource>,
    /// Outcome of the optional binding-proof layer; `Skipped` unless a
    /// proof was stored and a verifier is configured.
    pub binding: BindingCheck,
    /// The matched record, echoed back for display.
    pub certificate: Option<CertificateRecord>,
}

/// Service orchestrating lookups, commitment recomputation, anchor checks,
/// and the audit trail.
pub struct VerificationService {
    record_store: Arc<dyn CertificateStore>,
    anchor_log: Arc<dyn AnchorLog>,
    ledger: Arc<dyn LedgerClient>,
    audit_log: Arc<dyn VerificationLog>,
    binding_checker: Arc<BindingProofChecker>,
}

impl VerificationService {
    pub fn new(
        record_store: Arc<dyn CertificateStore>,
        anchor_log: Arc<dyn AnchorLog>,
        ledger: Arc<dyn LedgerClient>,
        audit_log: Arc<dyn VerificationLog>,
        binding_checker: Arc<BindingProofChecker>,
    ) -> Self {
        Self {
            record_store,
            anchor_log,
            ledger,
            audit_log,
            binding_checker,
        }
    }

    /// Verifies a certificate by its content hash.
    ///
    /// Every attempt against a known certificate is recorded in the audit
    /// log regardless of outcome. An unknown hash writes nothing: there is
    /// no certificate id to attribute the attempt to.
    pub async fn verify(&self, hash: &str) -> Result<VerificationResult, VerifyError> {
        let checked_at = Utc::now();

        let Some(record) = self.record_store.get_by_hash(hash).await? else {
            return Ok(VerificationResult {
                is_valid: false,
                reason: VerdictReason::NotFound,
                checked_at,
                anchor_source: None,
                binding: BindingCheck::Skipped,
                certificate: None,
            });
        };

        // Recompute the commitment from the stored fields. A mismatch means
        // the record store itself was altered; decisive regardless of
        // anchor status, so the anchor sources are not consulted.
        let expected = compute_hash(&record.fields);
        if expected != hash {
            self.record_attempt(record.id, false, checked_at).await;
            return Ok(VerificationResult {
                is_valid: false,
                reason: VerdictReason::HashMismatch,
                checked_at,
                anchor_source: None,
                binding: BindingCheck::Skipped,
                certificate: Some(record),
            });
        }

        let (anchor_present, source, local_entry) = match self.ledger.check(hash).await {
            Ok(present) => {
                // The local entry is only needed for the optional binding
                // layer here; a log failure must not fail the verdict.
                let entry = self.anchor_log.find(hash).await.ok().flatten();
                (present, AnchorSource::Ledger, entry)
            }
            Err(LedgerError::Unavailable(ledger_reason)) => {
                match self.anchor_log.find(hash).await {
                    Ok(entry) => (entry.is_some(), AnchorSource::LocalLog, entry),
                    Err(log_error) => {
                        return Err(VerifyError::Unavailable(format!(
                            "ledger: {}; anchor log: {}",
                            ledger_reason, log_error
                        )));
                    }
                }
            }
        };

        let binding = self.check_binding(&record, local_entry.as_ref());
        let is_valid = anchor_present;
        self.record_attempt(record.id, is_valid, checked_at).await;

        Ok(VerificationResult {
            is_valid,
            reason: if is_valid {
                VerdictReason::Anchored
            } else {
                VerdictReason::NotAnchored
            },
            checked_at,
            anchor_source: Some(source),
            binding,
            certificate: Some(record),
        })
    }

    /// Full verification history, oldest first.
    pub async fn history(&self) -> Result<Vec<VerificationRecord>, StorageError> {
        self.audit_log.list_all().await
    }

    fn check_binding(
        &self,
        record: &CertificateRecord,
        entry: Option<&AnchorEntry>,
    ) -> BindingCheck {
        let Some(entry) = entry else {
            return BindingCheck::Skipped;
        };
        match (&entry.proof, &entry.salt) {
            (Some(proof), Some(salt)) => {
                let commitment = compute_commitment(&record.fields, salt);
                self.binding_checker.check(proof, &commitment)
            }
            _ => BindingCheck::Skipped,
        }
    }

    /// Best-effort audit write: a failure here is an operational warning,
    /// never a reason to fail a computed verdict.
    async fn record_attempt(&self, certificate_id: i64, is_valid: bool, at: DateTime<Utc>) {
        let record = VerificationRecord {
            certificate_id,
            timestamp: at,
            is_valid,
        };
        if let Err(e) = self.audit_log.append(&record).await {
            warn!(
                "failed to record verification attempt for certificate {}: {}",
                certificate_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::certificate::NewCertificate;
    use crate::services::anchoring::AnchoringService;
    use crate::services::testing::{FailingAnchorLog, FakeLedgerClient};
    use crate::storage::anchor_log::FileAnchorLog;
    use crate::storage::audit_log::FileVerificationLog;
    use crate::storage::record_store::InMemoryCertificateStore;
    use crate::utils::commitment::CertificateFields;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        store: Arc<InMemoryCertificateStore>,
        anchoring: AnchoringService,
        verification: VerificationService,
        audit: Arc<FileVerificationLog>,
    }

    fn harness(ledger: FakeLedgerClient) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let ledger: Arc<dyn LedgerClient> = Arc::new(ledger);
        let anchor_log = Arc::new(FileAnchorLog::new(dir.path().join("anchors.jsonl")));
        let audit = Arc::new(FileVerificationLog::new(dir.path().join("audit.jsonl")));
        let store = Arc::new(InMemoryCertificateStore::new());

        let anchoring = AnchoringService::new(ledger.clone(), anchor_log.clone());
        let verification = VerificationService::new(
            store.clone(),
            anchor_log,
            ledger,
            audit.clone(),
            Arc::new(BindingProofChecker::Disabled),
        );

        Harness {
            _dir: dir,
            store,
            anchoring,
            verification,
            audit,
        }
    }

    fn sample_fields() -> CertificateFields {
        let mut fields = CertificateFields::new();
        fields.insert("studentName".into(), "Ada Lovelace".into());
        fields.insert("degree".into(), "BSc CS".into());
        fields.insert("registrationNumber".into(), "CS-042".into());
        fields
    }

    async fn issue(h: &Harness, fields: &CertificateFields) -> String {
        let (hash, _) = h.anchoring.anchor(fields).await.unwrap();
        h.store
            .insert(NewCertificate {
                student_ref: "student-1".into(),
                issue_date: Utc::now(),
                fields: fields.clone(),
                certificate_hash: hash.clone(),
            })
            .await
            .unwrap();
        hash
    }

    #[tokio::test]
    async fn test_verify_anchored_certificate() {
        let h = harness(FakeLedgerClient::connected());
        let hash = issue(&h, &sample_fields()).await;

        let result = h.verification.verify(&hash).await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.reason, VerdictReason::Anchored);
        assert_eq!(result.anchor_source, Some(AnchorSource::Ledger));
        assert_eq!(result.binding, BindingCheck::Skipped);
        assert_eq!(h.audit.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_after_degraded_anchor_uses_local_log() {
        let h = harness(FakeLedgerClient::degraded());
        let hash = issue(&h, &sample_fields()).await;

        let result = h.verification.verify(&hash).await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.reason, VerdictReason::Anchored);
        assert_eq!(result.anchor_source, Some(AnchorSource::LocalLog));

        let audit = h.audit.list_all().await.unwrap();
        assert_eq!(audit.len(), 1);
        assert!(audit[0].is_valid);
    }

    #[tokio::test]
    async fn test_unknown_hash_writes_no_audit_record() {
        let h = harness(FakeLedgerClient::connected());

        let result = h.verification.verify("nonexistent-hash").await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason, VerdictReason::NotFound);
        assert!(result.certificate.is_none());
        assert!(h.audit.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_without_anchor_is_not_valid() {
        let h = harness(FakeLedgerClient::connected());
        let fields = sample_fields();
        let hash = compute_hash(&fields);
        // Inserted directly, never anchored.
        h.store
            .insert(NewCertificate {
                student_ref: "student-1".into(),
                issue_date: Utc::now(),
                fields,
                certificate_hash: hash.clone(),
            })
            .await
            .unwrap();

        let result = h.verification.verify(&hash).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason, VerdictReason::NotAnchored);
        assert_eq!(h.audit.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_double_failure_is_unavailable_not_a_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let ledger: Arc<dyn LedgerClient> = Arc::new(FakeLedgerClient::degraded());
        let store = Arc::new(InMemoryCertificateStore::new());
        let audit = Arc::new(FileVerificationLog::new(dir.path().join("audit.jsonl")));

        let fields = sample_fields();
        let hash = compute_hash(&fields);
        store
            .insert(NewCertificate {
                student_ref: "student-1".into(),
                issue_date: Utc::now(),
                fields,
                certificate_hash: hash.clone(),
            })
            .await
            .unwrap();

        let verification = VerificationService::new(
            store,
            Arc::new(FailingAnchorLog),
            ledger,
            audit,
            Arc::new(BindingProofChecker::Disabled),
        );

        let result = verification.verify(&hash).await;
        assert!(matches!(result, Err(VerifyError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_end_to_end_tamper_detection() {
        let h = harness(FakeLedgerClient::connected());
        let hash = issue(&h, &sample_fields()).await;

        // Genuine certificate verifies.
        let result = h.verification.verify(&hash).await.unwrap();
        assert!(result.is_valid);

        // Corrupt the stored record without updating the hash.
        let mut tampered = sample_fields();
        tampered.insert("degree".into(), "BSc Math".into());
        h.store.corrupt_fields(&hash, tampered);

        let result = h.verification.verify(&hash).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason, VerdictReason::HashMismatch);

        // Both attempts were audited, in order.
        let audit = h.audit.list_all().await.unwrap();
        assert_eq!(audit.len(), 2);
        assert!(audit[0].is_valid);
        assert!(!audit[1].is_valid);
    }
}
