// src/models/anchor.rs
//! Anchor and audit data models.
//!
//! `AnchorEntry` is the unit of the append-only Anchor Log;
//! `VerificationRecord` is the unit of the verification audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to where a commitment was anchored.
///
/// A `Ledger` ref is a real transaction hash from the external chain; a
/// `Local` ref is synthesized deterministically from the certificate hash
/// and the anchoring time, so degraded-mode anchors stay unique and
/// traceable but are explicitly tagged as non-ledger-backed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "tx", rename_all = "lowercase")]
pub enum AnchorRef {
    Ledger(String),
    Local(String),
}

impl AnchorRef {
    /// The underlying transaction reference string.
    pub fn tx(&self) -> &str {
        match self {
            AnchorRef::Ledger(tx) | AnchorRef::Local(tx) => tx,
        }
    }

    /// Whether this anchor was committed to the external ledger.
    pub fn is_ledger_backed(&self) -> bool {
        matches!(self, AnchorRef::Ledger(_))
    }
}

impl std::fmt::Display for AnchorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorRef::Ledger(tx) => write!(f, "ledger:{}", tx),
            AnchorRef::Local(tx) => write!(f, "local:{}", tx),
        }
    }
}

/// One record of the append-only Anchor Log.
///
/// The log may hold multiple entries for the same hash (duplicate or retried
/// issuance attempts are tolerated); verification only needs at least one.
/// Entries are never deleted or rewritten.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnchorEntry {
    /// The certificate/commitment hash being anchored.
    pub hash: String,

    /// External transaction id or synthesized local reference.
    pub anchor_ref: AnchorRef,

    /// When the anchor was recorded.
    pub timestamp: DateTime<Utc>,

    /// Optional binding-proof payload (base64), for the pluggable proof layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,

    /// Optional salt used for the binding commitment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

/// One verification attempt, recorded unconditionally for audit whenever the
/// hash resolved to a known certificate. Never mutated or deleted.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VerificationRecord {
    /// Id of the certificate the attempt was made against.
    pub certificate_id: i64,

    /// When the verification ran.
    pub timestamp: DateTime<Utc>,

    /// Outcome of this single attempt.
    pub is_valid: bool,
}
