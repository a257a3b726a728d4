//! Reveal-proof verification for SecretVault
//!
//! A reveal proof is a Schnorr signature by the verifier authority over
//! (caller, target, nonce). The [`VerifierGateway`] checks binding, freshness
//! against a [`NonceTable`], and the signature.

pub mod authority;
pub mod nonce;
pub mod proof;
pub mod verifier;

pub use authority::{VerifierAuthority, VerifyingKey};
pub use nonce::{NonceEntry, NonceTable};
pub use proof::{RevealProof, SIGNATURE_BYTES};
pub use verifier::VerifierGateway;
