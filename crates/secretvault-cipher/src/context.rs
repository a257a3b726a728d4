//! Encryption context fingerprints

use blake2::{
    digest::{consts::U32, Digest},
    Blake2b,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use secretvault_runtime::{Result, VaultError};

type Blake2b256 = Blake2b<U32>;

const CONTEXT_DOMAIN: &[u8] = b"secretvault.context.v1";

/// Fingerprint of the public parameters a ciphertext was encrypted under
///
/// Two ciphertexts may only be combined when their contexts are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId([u8; 32]);

impl ContextId {
    /// Derive the context id from the encoded public key
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update(CONTEXT_DOMAIN);
        hasher.update(public_key);

        let mut id = [0u8; 32];
        id.copy_from_slice(&hasher.finalize());
        Self(id)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| VaultError::serialization_error(format!("context id: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VaultError::serialization_error("context id must be 32 bytes"))?;
        Ok(Self(bytes))
    }

    /// Fail with `ContextMismatch` unless `other` equals `self`
    pub fn ensure_matches(&self, other: &ContextId) -> Result<()> {
        if self != other {
            return Err(VaultError::context_mismatch(self.to_hex(), other.to_hex()));
        }
        Ok(())
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContextId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContextId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
