// src/models/certificate.rs
//! Certificate record data model.

use crate::utils::commitment::CertificateFields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored certificate as held by the Certificate Record Store.
///
/// # Invariant
/// `certificate_hash` is deterministic given `fields` and is never
/// recomputed to a different value for the same logical certificate.
/// Changing any field is modeled as a new certificate, not a mutation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CertificateRecord {
    /// Store-assigned identifier, unique within the record store.
    pub id: i64,

    /// Reference to the student the certificate was issued to.
    /// Example: "student-1042" or an external registry key.
    pub student_ref: String,

    /// When the certificate was issued.
    pub issue_date: DateTime<Utc>,

    /// Ordered attribute mapping the content hash is derived from
    /// (department, registrationNumber, joinDate, endDate, academicYear,
    /// finalScore, ...).
    pub fields: CertificateFields,

    /// SHA-256 content hash of `fields`, unique and immutable once assigned.
    pub certificate_hash: String,
}

/// Payload for inserting a certificate; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub student_ref: String,
    pub issue_date: DateTime<Utc>,
    pub fields: CertificateFields,
    pub certificate_hash: String,
}
