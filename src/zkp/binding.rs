// src/zkp/binding.rs
//! Optional commitment-binding proof layer.
//!
//! A binding proof is a Groth16 zk-SNARK over BN254 asserting knowledge of
//! the certificate fields behind a salted commitment. The layer is pluggable
//! and not load-bearing: anchor verification never depends on it.
//!
//! The checker has exactly two states. `Enabled` holds a real verifier with
//! key material loaded at startup; `Disabled` reports `Skipped` for every
//! check. Missing key material therefore surfaces as "not checked", never as
//! "verified". The dangerous fallback-to-true of naive implementations is
//! deliberately not reproduced.

use ark_bn254::{Bn254, Fr as Bn254Fr};
use ark_ff::PrimeField;
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use ark_snark::SNARK;
use log::warn;
use std::path::Path;

/// Outcome of a binding-proof check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingCheck {
    /// Proof verified against the commitment.
    Valid,
    /// Proof present but failed verification (or was malformed).
    Invalid,
    /// No verifier configured; explicitly non-cryptographic.
    Skipped,
}

/// Pluggable binding-proof capability.
pub enum BindingProofChecker {
    Enabled(Groth16BindingVerifier),
    Disabled,
}

impl BindingProofChecker {
    /// Builds the checker from an optional verifying-key file. Absent or
    /// unloadable key material yields `Disabled` (with an operator warning),
    /// never a verifier that answers `Valid` unconditionally.
    pub fn from_key_file(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return BindingProofChecker::Disabled;
        };
        match Groth16BindingVerifier::load(path) {
            Ok(verifier) => BindingProofChecker::Enabled(verifier),
            Err(e) => {
                warn!(
                    "binding proof key {} unusable, checker disabled: {}",
                    path.display(),
                    e
                );
                BindingProofChecker::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, BindingProofChecker::Enabled(_))
    }

    /// Checks a base64 proof against a hex commitment. Errors (malformed
    /// proof, bad encoding) count as `Invalid`: an unverifiable proof is
    /// not a valid one.
    pub fn check(&self, proof_base64: &str, commitment: &str) -> BindingCheck {
        match self {
            BindingProofChecker::Disabled => BindingCheck::Skipped,
            BindingProofChecker::Enabled(verifier) => {
                match verifier.verify(proof_base64, commitment) {
                    Ok(true) => BindingCheck::Valid,
                    Ok(false) => BindingCheck::Invalid,
                    Err(e) => {
                        warn!("binding proof rejected as malformed: {}", e);
                        BindingCheck::Invalid
                    }
                }
            }
        }
    }
}

/// Groth16/BN254 verifier with a pre-generated verifying key.
pub struct Groth16BindingVerifier {
    vk: VerifyingKey<Bn254>,
}

impl Groth16BindingVerifier {
    /// Loads a compressed verifying key from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(&bytes[..])
            .map_err(|e| anyhow::anyhow!("verifying key deserialization failed: {}", e))?;
        Ok(Self { vk })
    }

    /// Verifies a compressed, base64-encoded proof. The public input is the
    /// commitment digest mapped into the scalar field.
    fn verify(&self, proof_base64: &str, commitment: &str) -> anyhow::Result<bool> {
        let proof_bytes = base64::decode(proof_base64)
            .map_err(|e| anyhow::anyhow!("base64 decoding failed: {}", e))?;
        let proof = Proof::<Bn254>::deserialize_compressed(&proof_bytes[..])
            .map_err(|e| anyhow::anyhow!("proof deserialization failed: {}", e))?;

        let commitment_bytes = hex::decode(commitment)
            .map_err(|e| anyhow::anyhow!("commitment is not valid hex: {}", e))?;
        let public_input = Bn254Fr::from_le_bytes_mod_order(&commitment_bytes);

        Groth16::<Bn254>::verify(&self.vk, &[public_input], &proof)
            .map_err(|e| anyhow::anyhow!("proof verification failed: {}", e))
    }
}
