//! SecretVault Cipher
//!
//! Additively homomorphic encrypted balances. The ledger is written against
//! the [`EncryptedValue`] and [`RevealKey`] traits; [`elgamal`] provides the
//! default scheme (exponential ElGamal on the Vesta curve).

pub mod context;
pub mod elgamal;
pub mod traits;

pub use context::ContextId;
pub use elgamal::{
    ElGamalCiphertext, ElGamalRevealKey, EncryptionKey, DEFAULT_REVEAL_BOUND_BITS,
    MAX_REVEAL_BOUND_BITS,
};
pub use traits::{EncryptedValue, RevealKey};
