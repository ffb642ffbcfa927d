// src/utils/commitment.rs
//! Commitment engine: deterministic content hashing of certificate fields.
//!
//! The certificate hash is a SHA-256 digest of the canonical JSON
//! serialization of the field mapping. Fields live in a `BTreeMap`, so
//! iteration (and therefore serialization) order is lexicographic by
//! construction, so two logically identical records can never hash
//! differently because of insertion order.
//!
//! No I/O; every function here is pure given its inputs.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Ordered certificate attribute mapping (name -> value).
pub type CertificateFields = BTreeMap<String, String>;

/// Computes the 256-bit content hash of a certificate's fields.
///
/// Returns a 64-character lowercase hex digest. Deterministic: the same
/// mapping always yields the same digest regardless of how it was built.
pub fn compute_hash(fields: &CertificateFields) -> String {
    let canonical = serde_json::to_string(fields)
        .expect("string map serialization is infallible");
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Computes a salted binding commitment over the same canonical
/// serialization. Deterministic given `(fields, salt)`. Used by the
/// optional binding-proof layer; not part of the certificate hash itself.
pub fn compute_commitment(fields: &CertificateFields, salt: &str) -> String {
    let canonical = serde_json::to_string(fields)
        .expect("string map serialization is infallible");
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a fresh salt for binding commitments.
///
/// Hashes wall-clock time together with CSPRNG material, yielding a
/// 64-character hex string.
pub fn generate_salt() -> String {
    let mut hasher = Sha256::new();
    hasher.update(chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(rand::random::<[u8; 16]>());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> CertificateFields {
        let mut fields = CertificateFields::new();
        fields.insert("studentName".into(), "Ada Lovelace".into());
        fields.insert("degree".into(), "BSc CS".into());
        fields.insert("registrationNumber".into(), "CS-042".into());
        fields
    }

    #[test]
    fn test_hash_is_deterministic() {
        let fields = sample_fields();
        assert_eq!(compute_hash(&fields), compute_hash(&fields));
        assert_eq!(compute_hash(&fields).len(), 64);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let forward = sample_fields();

        let mut reversed = CertificateFields::new();
        reversed.insert("registrationNumber".into(), "CS-042".into());
        reversed.insert("degree".into(), "BSc CS".into());
        reversed.insert("studentName".into(), "Ada Lovelace".into());

        assert_eq!(compute_hash(&forward), compute_hash(&reversed));
    }

    #[test]
    fn test_single_character_mutation_changes_hash() {
        let fields = sample_fields();
        let original = compute_hash(&fields);

        for (key, value) in fields.iter() {
            let mut mutated = fields.clone();
            let mut tampered = value.clone();
            tampered.replace_range(0..1, "X");
            mutated.insert(key.clone(), tampered);
            assert_ne!(compute_hash(&mutated), original, "mutation of {} undetected", key);
        }
    }

    #[test]
    fn test_commitment_depends_on_salt() {
        let fields = sample_fields();
        let a = compute_commitment(&fields, "salt-a");
        let b = compute_commitment(&fields, "salt-b");
        assert_ne!(a, b);
        assert_eq!(a, compute_commitment(&fields, "salt-a"));
        assert_ne!(a, compute_hash(&fields));
    }

    #[test]
    fn test_generated_salts_are_unique_hex() {
        let a = generate_salt();
        let b = generate_salt();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
