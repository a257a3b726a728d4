//! Verifier gateway for reveal proofs

use tracing::{debug, info};

use secretvault_runtime::{CallerId, Result, RevealTarget, VaultError};

use crate::{authority::VerifyingKey, nonce::NonceTable, proof::RevealProof};

/// Checks reveal proofs against the verifier authority's key
///
/// Holds only the verifying key. Caller state (the nonce table) belongs to the
/// ledger and is passed in, so the ledger can consume the nonce in the same
/// step that records the reveal.
#[derive(Debug, Clone)]
pub struct VerifierGateway {
    verifying_key: VerifyingKey,
}

impl VerifierGateway {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Verify `proof` for a reveal of `target` by `caller`
    ///
    /// Returns the nonce the caller must consume on success. Checks run in a
    /// fixed order: binding (`ProofMismatch`), freshness (`ReplayDetected`),
    /// then the signature (`ProofInvalid`).
    pub fn verify(
        &self,
        proof: &RevealProof,
        caller: &CallerId,
        target: &RevealTarget,
        nonces: &NonceTable,
    ) -> Result<u64> {
        if proof.caller != *caller {
            return Err(VaultError::proof_mismatch("proof is bound to a different caller"));
        }
        if proof.target != *target {
            return Err(VaultError::proof_mismatch("proof is bound to a different target"));
        }
        if !nonces.is_fresh(caller, target, proof.nonce) {
            return Err(VaultError::ReplayDetected { nonce: proof.nonce });
        }

        self.verifying_key.verify_signature(proof)?;

        debug!(%caller, %target, nonce = proof.nonce, "reveal proof verified");
        Ok(proof.nonce)
    }

    /// Replace the trust anchor, returning the previous key
    ///
    /// Only reachable through the ledger's governance-gated rotation.
    pub fn rotate(&mut self, verifying_key: VerifyingKey) -> VerifyingKey {
        let previous = std::mem::replace(&mut self.verifying_key, verifying_key);
        info!(previous = %previous, next = %self.verifying_key, "verifier key rotated");
        previous
    }
}
