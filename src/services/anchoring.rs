// src/services/anchoring.rs
//! Anchoring Service.
//!
//! Orchestrates issuance-side anchoring: compute the commitment, attempt
//! the external ledger, and always record the anchor in the local
//! append-only log. Ledger unavailability degrades the anchor (weaker
//! tamper-evidence) but never blocks issuance; losing the anchor log write
//! does fail the call, because that would leave zero durable record.
//!
//! Anchor-then-log ordering is deliberate: a lost local copy can be
//! recovered by re-querying the ledger, a lost ledger write cannot.

use crate::blockchain::ledger_client::LedgerClient;
use crate::error::{AnchorServiceError, LedgerError};
use crate::models::anchor::{AnchorEntry, AnchorRef};
use crate::storage::anchor_log::AnchorLog;
use crate::utils::commitment::{compute_hash, generate_salt, CertificateFields};
use chrono::{DateTime, Utc};
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Service that owns the decision of when an `AnchorEntry` is written.
pub struct AnchoringService {
    ledger: Arc<dyn LedgerClient>,
    anchor_log: Arc<dyn AnchorLog>,
}

impl AnchoringService {
    pub fn new(ledger: Arc<dyn LedgerClient>, anchor_log: Arc<dyn AnchorLog>) -> Self {
        Self { ledger, anchor_log }
    }

    /// Anchors a certificate's fields. Returns the content hash and the
    /// anchor reference (ledger transaction or synthesized local ref).
    pub async fn anchor(
        &self,
        fields: &CertificateFields,
    ) -> Result<(String, AnchorRef), AnchorServiceError> {
        self.anchor_with_proof(fields, None).await
    }

    /// Like [`anchor`](Self::anchor), attaching an externally produced
    /// binding-proof payload to the log entry.
    pub async fn anchor_with_proof(
        &self,
        fields: &CertificateFields,
        proof: Option<String>,
    ) -> Result<(String, AnchorRef), AnchorServiceError> {
        let hash = compute_hash(fields);
        let now = Utc::now();

        let anchor_ref = match self.ledger.anchor(&hash).await {
            Ok(tx) => {
                info!("hash {} anchored on ledger, tx {}", hash, tx);
                AnchorRef::Ledger(tx)
            }
            Err(LedgerError::Unavailable(reason)) => {
                warn!(
                    "ledger unavailable while anchoring {} ({}), recording local anchor",
                    hash, reason
                );
                AnchorRef::Local(synthesize_local_ref(&hash, now))
            }
        };

        let entry = AnchorEntry {
            hash: hash.clone(),
            anchor_ref: anchor_ref.clone(),
            timestamp: now,
            proof,
            salt: Some(generate_salt()),
        };
        self.anchor_log.append(&entry).await?;

        Ok((hash, anchor_ref))
    }
}

/// Synthesizes a non-ledger anchor reference from the hash and the anchoring
/// time: unique and traceable, and distinguishable from a real transaction
/// by its `AnchorRef::Local` tag.
fn synthesize_local_ref(hash: &str, at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash.as_bytes());
    hasher.update(at.timestamp_millis().to_le_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}
