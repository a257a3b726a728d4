//! Verifier authority keys
//!
//! The authority signs reveal statements with a Schnorr signature on the
//! Vesta curve. Only its public [`VerifyingKey`] is held by the gateway.

use ff::{Field, PrimeField};
use group::{Group, GroupEncoding};
use halo2curves::pasta::{Eq, Fp};
use rand::{CryptoRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use secretvault_runtime::{CallerId, Result, RevealTarget, VaultError};

use crate::proof::{challenge, encode_statement, RevealProof, SIGNATURE_BYTES};

/// Public identity of the verifier authority; the gateway's trust anchor
#[derive(Clone, Copy, PartialEq)]
pub struct VerifyingKey {
    point: Eq,
}

impl VerifyingKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let repr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VaultError::serialization_error("verifying key must be 32 bytes"))?;
        let point = Option::<Eq>::from(Eq::from_bytes(&repr))
            .ok_or_else(|| VaultError::serialization_error("invalid verifying key encoding"))?;
        if bool::from(point.is_identity()) {
            return Err(VaultError::serialization_error("verifying key is the identity point"));
        }
        Ok(Self { point })
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))
            .map_err(|e| VaultError::serialization_error(format!("verifying key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.point.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Check the Schnorr equation `s·G == R + e·PK` for `proof`
    pub fn verify_signature(&self, proof: &RevealProof) -> Result<()> {
        if proof.signature.len() != SIGNATURE_BYTES {
            return Err(VaultError::proof_invalid("malformed signature"));
        }

        let (r_bytes, s_bytes) = proof.signature.split_at(32);
        let mut r_repr = [0u8; 32];
        r_repr.copy_from_slice(r_bytes);
        let mut s_repr = [0u8; 32];
        s_repr.copy_from_slice(s_bytes);

        let commitment = Option::<Eq>::from(Eq::from_bytes(&r_repr))
            .ok_or_else(|| VaultError::proof_invalid("malformed signature"))?;
        let response = Option::<Fp>::from(Fp::from_repr(s_repr))
            .ok_or_else(|| VaultError::proof_invalid("malformed signature"))?;

        let statement = proof.statement_bytes()?;
        let e = challenge(&r_repr, &self.to_bytes(), &statement);

        if Eq::generator() * response == commitment + self.point * e {
            Ok(())
        } else {
            Err(VaultError::proof_invalid("signature does not verify"))
        }
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyingKey({})", self.to_hex())
    }
}

impl fmt::Display for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Signing side of the verifier authority
///
/// Lives outside the ledger; the CLI and tests use it to stand in for the
/// external authority that issues reveal proofs.
pub struct VerifierAuthority {
    secret: Fp,
    verifying_key: VerifyingKey,
}

impl VerifierAuthority {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let secret = Fp::random(&mut *rng);
            if !bool::from(secret.is_zero()) {
                return Self::from_secret(secret);
            }
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let repr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VaultError::serialization_error("authority key must be 32 bytes"))?;
        let secret = Option::<Fp>::from(Fp::from_repr(repr))
            .ok_or_else(|| VaultError::serialization_error("authority key is not a field element"))?;
        if bool::from(secret.is_zero()) {
            return Err(VaultError::serialization_error("authority key must be non-zero"));
        }
        Ok(Self::from_secret(secret))
    }

    fn from_secret(secret: Fp) -> Self {
        Self { secret, verifying_key: VerifyingKey { point: Eq::generator() * secret } }
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_repr()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.verifying_key
    }

    /// Sign a reveal statement for (caller, target, nonce)
    pub fn issue<R: RngCore + CryptoRng>(
        &self,
        caller: CallerId,
        target: RevealTarget,
        nonce: u64,
        rng: &mut R,
    ) -> Result<RevealProof> {
        let statement = encode_statement(&caller, &target, nonce)?;

        let k = Fp::random(&mut *rng);
        let commitment = (Eq::generator() * k).to_bytes();
        let e = challenge(&commitment, &self.verifying_key.to_bytes(), &statement);
        let response = k + e * self.secret;

        let mut signature = Vec::with_capacity(SIGNATURE_BYTES);
        signature.extend_from_slice(&commitment);
        signature.extend_from_slice(&response.to_repr());

        Ok(RevealProof::new(caller, target, nonce, signature))
    }
}

impl fmt::Debug for VerifierAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierAuthority")
            .field("verifying_key", &self.verifying_key)
            .finish_non_exhaustive()
    }
}
