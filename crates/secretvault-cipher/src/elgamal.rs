//! Exponential ElGamal over the Vesta curve
//!
//! A balance `m` is encrypted under the public point `H = y·G` as
//! `(c1, c2) = (r·G, m·G + r·H)`. Adding ciphertexts component-wise adds the
//! plaintexts, and multiplying both components by a scalar multiplies the
//! plaintext. Decryption strips the mask (`c2 - y·c1 = m·G`) and solves the
//! bounded discrete log with baby-step/giant-step.
//!
//! Plaintexts live in the scalar field `Fp`; subtraction below zero wraps and
//! such a balance no longer decrypts within the reveal bound.

use ff::{Field, PrimeField};
use group::{prime::PrimeCurveAffine, Curve, Group, GroupEncoding};
use halo2curves::pasta::{Eq, EqAffine, Fp};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::OnceLock};
use tracing::debug;

use secretvault_runtime::{Result, VaultError};

use crate::{
    context::ContextId,
    traits::{EncryptedValue, RevealKey},
};

/// Default plaintext search bound (values below 2^32 are revealable)
pub const DEFAULT_REVEAL_BOUND_BITS: u32 = 32;

/// Largest supported bound; the baby-step table holds 2^20 points
pub const MAX_REVEAL_BOUND_BITS: u32 = 40;

const POINT_BYTES: usize = 32;

fn decode_point(bytes: &[u8]) -> Result<Eq> {
    let repr: [u8; POINT_BYTES] = bytes
        .try_into()
        .map_err(|_| VaultError::serialization_error("curve point must be 32 bytes"))?;
    Option::<Eq>::from(Eq::from_bytes(&repr))
        .ok_or_else(|| VaultError::serialization_error("invalid curve point encoding"))
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim().trim_start_matches("0x"))
        .map_err(|e| VaultError::serialization_error(format!("hex: {}", e)))
}

/// Public encryption key; anyone holding it can produce deposits
#[derive(Clone, PartialEq)]
pub struct EncryptionKey {
    point: Eq,
    context: ContextId,
}

impl EncryptionKey {
    fn from_point(point: Eq) -> Self {
        let context = ContextId::from_public_key(&point.to_bytes());
        Self { point, context }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let point = decode_point(bytes)?;
        if bool::from(point.is_identity()) {
            return Err(VaultError::serialization_error("encryption key is the identity point"));
        }
        Ok(Self::from_point(point))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(&decode_hex(s)?)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.point.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    /// Encrypt `amount` with fresh randomness
    pub fn encrypt<R: RngCore + CryptoRng>(&self, amount: u64, rng: &mut R) -> ElGamalCiphertext {
        let r = Fp::random(&mut *rng);
        let g = Eq::generator();

        ElGamalCiphertext {
            context: self.context,
            c1: g * r,
            c2: g * Fp::from(amount) + self.point * r,
        }
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey").field("context", &self.context).finish()
    }
}

/// ElGamal ciphertext together with the context it was encrypted under
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EncodedCiphertext", try_from = "EncodedCiphertext")]
pub struct ElGamalCiphertext {
    context: ContextId,
    c1: Eq,
    c2: Eq,
}

#[derive(Serialize, Deserialize)]
struct EncodedCiphertext {
    context: ContextId,
    c1: String,
    c2: String,
}

impl From<ElGamalCiphertext> for EncodedCiphertext {
    fn from(ct: ElGamalCiphertext) -> Self {
        Self {
            context: ct.context,
            c1: hex::encode(ct.c1.to_bytes()),
            c2: hex::encode(ct.c2.to_bytes()),
        }
    }
}

impl TryFrom<EncodedCiphertext> for ElGamalCiphertext {
    type Error = VaultError;

    fn try_from(encoded: EncodedCiphertext) -> Result<Self> {
        Ok(Self {
            context: encoded.context,
            c1: decode_point(&decode_hex(&encoded.c1)?)?,
            c2: decode_point(&decode_hex(&encoded.c2)?)?,
        })
    }
}

impl ElGamalCiphertext {
    /// Encryption of zero with no randomness; the neutral element
    pub fn zero(context: ContextId) -> Self {
        Self { context, c1: Eq::identity(), c2: Eq::identity() }
    }

    /// Compact hex form: context id, then `c1`, then `c2` (96 bytes)
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(3 * POINT_BYTES);
        bytes.extend_from_slice(self.context.as_bytes());
        bytes.extend_from_slice(&self.c1.to_bytes());
        bytes.extend_from_slice(&self.c2.to_bytes());
        hex::encode(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)?;
        if bytes.len() != 3 * POINT_BYTES {
            return Err(VaultError::serialization_error(format!(
                "ciphertext must be {} bytes, got {}",
                3 * POINT_BYTES,
                bytes.len()
            )));
        }

        let mut context = [0u8; POINT_BYTES];
        context.copy_from_slice(&bytes[..POINT_BYTES]);

        Ok(Self {
            context: ContextId::from_bytes(context),
            c1: decode_point(&bytes[POINT_BYTES..2 * POINT_BYTES])?,
            c2: decode_point(&bytes[2 * POINT_BYTES..])?,
        })
    }

    fn scale_by(&self, scalar: Fp) -> Self {
        Self { context: self.context, c1: self.c1 * scalar, c2: self.c2 * scalar }
    }
}

impl fmt::Debug for ElGamalCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c1 = hex::encode(self.c1.to_bytes());
        let c2 = hex::encode(self.c2.to_bytes());
        f.debug_struct("ElGamalCiphertext")
            .field("context", &self.context)
            .field("c1", &&c1[..16])
            .field("c2", &&c2[..16])
            .finish()
    }
}

impl EncryptedValue for ElGamalCiphertext {
    fn context(&self) -> &ContextId {
        &self.context
    }

    fn add(&self, rhs: &Self) -> Result<Self> {
        self.context.ensure_matches(&rhs.context)?;
        Ok(Self { context: self.context, c1: self.c1 + rhs.c1, c2: self.c2 + rhs.c2 })
    }

    fn sub(&self, rhs: &Self) -> Result<Self> {
        self.context.ensure_matches(&rhs.context)?;
        Ok(Self { context: self.context, c1: self.c1 - rhs.c1, c2: self.c2 - rhs.c2 })
    }

    fn scalar_mul(&self, k: u64) -> Self {
        self.scale_by(Fp::from(k))
    }

    fn scalar_div_exact(&self, d: u64) -> Result<Self> {
        let inverse = Option::<Fp>::from(Fp::from(d).invert())
            .ok_or_else(|| VaultError::allocation_invalid("division by zero"))?;
        Ok(self.scale_by(inverse))
    }
}

/// Precomputed `j·G` for `j` in `0..size`, keyed by compressed encoding
struct BabyStepTable {
    steps: HashMap<[u8; 32], u64>,
    size: u64,
    giant_step: Eq,
}

impl BabyStepTable {
    fn build(bound_bits: u32) -> Self {
        let baby_bits = bound_bits.div_ceil(2);
        let size = 1u64 << baby_bits;
        debug!(bound_bits, size, "building baby-step table");

        let g = Eq::generator();
        let mut points = Vec::with_capacity(size as usize);
        let mut acc = Eq::identity();
        for _ in 0..size {
            points.push(acc);
            acc += g;
        }

        let mut affine = vec![<EqAffine as PrimeCurveAffine>::identity(); points.len()];
        Eq::batch_normalize(&points, &mut affine);

        let steps = affine.iter().zip(0u64..).map(|(p, j)| (p.to_bytes(), j)).collect();

        Self { steps, size, giant_step: g * Fp::from(size) }
    }

    /// Find `m < 2^bound_bits` with `m·G == target`
    fn solve(&self, target: Eq, bound_bits: u32) -> Option<u64> {
        let giant_steps = (1u64 << bound_bits) / self.size;
        let mut gamma = target;

        for i in 0..giant_steps {
            if let Some(j) = self.steps.get(&gamma.to_affine().to_bytes()) {
                return Some(i * self.size + j);
            }
            gamma -= self.giant_step;
        }

        None
    }
}

/// Secret key of an encryption context, used only to reveal
pub struct ElGamalRevealKey {
    secret: Fp,
    public: EncryptionKey,
    bound_bits: u32,
    table: OnceLock<BabyStepTable>,
}

impl ElGamalRevealKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, bound_bits: u32) -> Result<Self> {
        loop {
            let secret = Fp::random(&mut *rng);
            if !bool::from(secret.is_zero()) {
                return Self::from_secret(secret, bound_bits);
            }
        }
    }

    pub fn from_secret_bytes(bytes: &[u8], bound_bits: u32) -> Result<Self> {
        let repr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VaultError::serialization_error("reveal key must be 32 bytes"))?;
        let secret = Option::<Fp>::from(Fp::from_repr(repr))
            .ok_or_else(|| VaultError::serialization_error("reveal key is not a field element"))?;
        if bool::from(secret.is_zero()) {
            return Err(VaultError::serialization_error("reveal key must be non-zero"));
        }
        Self::from_secret(secret, bound_bits)
    }

    fn from_secret(secret: Fp, bound_bits: u32) -> Result<Self> {
        if bound_bits == 0 || bound_bits > MAX_REVEAL_BOUND_BITS {
            return Err(VaultError::invalid_config(format!(
                "reveal bound must be between 1 and {} bits, got {}",
                MAX_REVEAL_BOUND_BITS, bound_bits
            )));
        }

        Ok(Self {
            secret,
            public: EncryptionKey::from_point(Eq::generator() * secret),
            bound_bits,
            table: OnceLock::new(),
        })
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_repr()
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.public
    }

    pub fn bound_bits(&self) -> u32 {
        self.bound_bits
    }

    fn unmask(&self, value: &ElGamalCiphertext) -> Result<Eq> {
        self.ensure_context(value)?;
        Ok(value.c2 - value.c1 * self.secret)
    }
}

impl fmt::Debug for ElGamalRevealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElGamalRevealKey")
            .field("context", self.public.context())
            .field("bound_bits", &self.bound_bits)
            .finish_non_exhaustive()
    }
}

impl RevealKey for ElGamalRevealKey {
    type Value = ElGamalCiphertext;

    fn context(&self) -> &ContextId {
        self.public.context()
    }

    fn zero(&self) -> ElGamalCiphertext {
        ElGamalCiphertext::zero(*self.public.context())
    }

    fn decrypt(&self, value: &ElGamalCiphertext) -> Result<u64> {
        let point = self.unmask(value)?;
        let table = self.table.get_or_init(|| BabyStepTable::build(self.bound_bits));

        table
            .solve(point, self.bound_bits)
            .ok_or(VaultError::DecryptionOutOfRange { bound_bits: self.bound_bits })
    }

    fn is_zero(&self, value: &ElGamalCiphertext) -> Result<bool> {
        Ok(bool::from(self.unmask(value)?.is_identity()))
    }
}
