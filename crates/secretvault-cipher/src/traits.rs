//! Encrypted-arithmetic boundary
//!
//! The ledger only talks to balances through these two traits, so the
//! underlying scheme can be swapped without touching ledger logic.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use secretvault_runtime::Result;

use crate::context::ContextId;

/// Opaque ciphertext of a non-negative integer balance
///
/// There is no plaintext accessor. Combining two values
/// encrypted under different contexts fails with `ContextMismatch`.
pub trait EncryptedValue: Clone + Debug + PartialEq + Serialize + DeserializeOwned {
    fn context(&self) -> &ContextId;

    /// Ciphertext of the plaintext sum
    fn add(&self, rhs: &Self) -> Result<Self>;

    /// Ciphertext of the plaintext difference; wraps in the plaintext field
    fn sub(&self, rhs: &Self) -> Result<Self>;

    /// Ciphertext of the plaintext multiplied by `k`
    fn scalar_mul(&self, k: u64) -> Self;

    /// Ciphertext of the plaintext divided by `d`
    ///
    /// Only meaningful when `d` divides the plaintext; otherwise the result
    /// decrypts outside any reveal bound.
    fn scalar_div_exact(&self, d: u64) -> Result<Self>;
}

/// Secret side of an encryption context
///
/// Held by the ledger and used only on the gated reveal path.
pub trait RevealKey {
    type Value: EncryptedValue;

    fn context(&self) -> &ContextId;

    /// Publicly known encryption of zero under this context
    fn zero(&self) -> Self::Value;

    /// Recover the plaintext of `value`
    fn decrypt(&self, value: &Self::Value) -> Result<u64>;

    /// Whether `value` encrypts zero, without recovering the plaintext
    fn is_zero(&self, value: &Self::Value) -> Result<bool>;

    /// Fail with `ContextMismatch` unless `value` belongs to this context
    fn ensure_context(&self, value: &Self::Value) -> Result<()> {
        self.context().ensure_matches(value.context())
    }
}
