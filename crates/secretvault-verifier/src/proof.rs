//! Reveal proofs and the statement they sign

use blake2::{Blake2b512, Digest};
use ff::FromUniformBytes;
use halo2curves::pasta::Fp;
use serde::{Deserialize, Serialize};

use secretvault_runtime::{CallerId, Result, RevealTarget, VaultError};

/// Encoded signature length: compressed `R` followed by the scalar `s`
pub const SIGNATURE_BYTES: usize = 64;

const STATEMENT_DOMAIN: &str = "secretvault.reveal.v1";
const CHALLENGE_DOMAIN: &[u8] = b"secretvault.challenge.v1";

/// Single-use credential entitling `caller` to reveal `target`
///
/// Issued by the verifier authority. Once a nonce has been consumed for a
/// (caller, target) pair, that proof and every proof with a lower nonce is
/// rejected as a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealProof {
    pub caller: CallerId,
    pub target: RevealTarget,
    pub nonce: u64,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl RevealProof {
    pub fn new(caller: CallerId, target: RevealTarget, nonce: u64, signature: Vec<u8>) -> Self {
        Self { caller, target, nonce, signature }
    }

    /// Canonical bytes covered by the signature
    pub fn statement_bytes(&self) -> Result<Vec<u8>> {
        encode_statement(&self.caller, &self.target, self.nonce)
    }
}

#[derive(Serialize)]
struct ProofStatement<'a> {
    domain: &'a str,
    caller: &'a CallerId,
    target: &'a RevealTarget,
    nonce: u64,
}

pub(crate) fn encode_statement(
    caller: &CallerId,
    target: &RevealTarget,
    nonce: u64,
) -> Result<Vec<u8>> {
    let statement = ProofStatement { domain: STATEMENT_DOMAIN, caller, target, nonce };
    postcard::to_allocvec(&statement)
        .map_err(|e| VaultError::serialization_error(format!("proof statement: {}", e)))
}

/// Fiat-Shamir challenge `H(R || PK || statement)` as a scalar
pub(crate) fn challenge(commitment: &[u8], public_key: &[u8], statement: &[u8]) -> Fp {
    let mut hasher = Blake2b512::new();
    hasher.update(CHALLENGE_DOMAIN);
    hasher.update(commitment);
    hasher.update(public_key);
    hasher.update(statement);

    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Fp::from_uniform_bytes(&wide)
}
