// src/error.rs
//! Error taxonomy for the certificate anchoring core.
//!
//! Each layer gets its own error type so callers can tell apart the cases
//! that matter operationally:
//! - `StorageError`: the anchor log / record store could not be read or
//!   written. Fatal for the current operation, never means "hash absent".
//! - `LedgerError`: the external ledger is unreachable or timed out.
//!   Transient and expected; always has a fallback path during anchoring.
//! - `AnchorServiceError`: anchoring failed outright (only storage can
//!   cause this; ledger unavailability degrades, it does not fail).
//! - `VerifyError`: both anchor sources failed, so no verdict can be given.
//!   Distinct from `is_valid = false`.

use thiserror::Error;

/// Anchor Log / Certificate Record Store failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file or directory I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure (lock poisoning, constraint violation, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// External ledger failure. A successful `false` from a ledger query is a
/// result, not an error; this type only covers "could not ask".
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The client is degraded, disconnected, or the bounded-timeout call
    /// did not complete in time.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Failure modes of the Anchoring Service. Ledger unavailability is absorbed
/// (issuance must not be hostage to blockchain availability), so the only
/// hard failure is losing the local anchor record as well.
#[derive(Debug, Error)]
pub enum AnchorServiceError {
    /// The anchor log append failed: no durable record of the anchor would
    /// remain, so the operation aborts rather than returning a false success.
    #[error("anchor log write failed: {0}")]
    Storage(#[from] StorageError),
}

/// Failure modes of the Verification Service.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Both the ledger check and the local log check failed. Surfaced
    /// instead of guessing: a silent wrong answer is worse than an explicit
    /// failure in an authenticity system.
    #[error("verification unavailable: {0}")]
    Unavailable(String),

    /// The certificate record store itself could not be queried.
    #[error("record store unavailable: {0}")]
    RecordStore(#[from] StorageError),
}
