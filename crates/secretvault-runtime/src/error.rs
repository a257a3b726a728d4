//! Error types for SecretVault

use thiserror::Error;

/// Result type alias for SecretVault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for SecretVault operations
///
/// Every variant is terminal for the invoking call. Retrying is up to the
/// caller (for example by resubmitting the transaction).
#[derive(Debug, Error)]
pub enum VaultError {
    /// Caller is not allowed to deposit into the treasury
    #[error("Unauthorized depositor: {0}")]
    UnauthorizedDepositor(String),

    /// Category id is not part of the ledger
    #[error("Unknown category: {0}")]
    CategoryUnknown(String),

    /// Ciphertexts were encrypted under different contexts
    #[error("Encryption context mismatch: expected {expected}, found {found}")]
    ContextMismatch { expected: String, found: String },

    /// Effective tier is Restricted; no proof was evaluated
    #[error("Access denied")]
    AccessDenied,

    /// Proof is bound to another caller or target
    #[error("Proof mismatch: {0}")]
    ProofMismatch(String),

    /// Proof nonce was already consumed
    #[error("Replay detected: nonce {nonce} already consumed")]
    ReplayDetected { nonce: u64 },

    /// Proof failed the cryptographic check
    #[error("Invalid proof: {0}")]
    ProofInvalid(String),

    /// Target percentages are malformed or do not sum to 100
    #[error("Invalid allocation: {0}")]
    AllocationInvalid(String),

    /// Governance-gated call made by someone other than the governance authority
    #[error("Governance authority required, got {0}")]
    GovernanceRequired(String),

    /// Decrypted value lies outside the searchable plaintext range
    #[error("Decrypted value outside reveal bound of 2^{bound_bits}")]
    DecryptionOutOfRange { bound_bits: u32 },

    /// Invalid ledger configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl VaultError {
    pub fn unauthorized_depositor(caller: impl Into<String>) -> Self {
        Self::UnauthorizedDepositor(caller.into())
    }

    pub fn category_unknown(category: impl Into<String>) -> Self {
        Self::CategoryUnknown(category.into())
    }

    pub fn context_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ContextMismatch { expected: expected.into(), found: found.into() }
    }

    pub fn proof_mismatch(msg: impl Into<String>) -> Self {
        Self::ProofMismatch(msg.into())
    }

    pub fn proof_invalid(msg: impl Into<String>) -> Self {
        Self::ProofInvalid(msg.into())
    }

    pub fn allocation_invalid(msg: impl Into<String>) -> Self {
        Self::AllocationInvalid(msg.into())
    }

    pub fn governance_required(identity: impl Into<String>) -> Self {
        Self::GovernanceRequired(identity.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// True for the failures produced by the proof check itself.
    ///
    /// These are the outcomes recorded as denied reveals in the audit log.
    pub fn is_proof_failure(&self) -> bool {
        matches!(self, Self::ProofMismatch(_) | Self::ReplayDetected { .. } | Self::ProofInvalid(_))
    }
}
