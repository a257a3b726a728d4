//! SecretVault Runtime
//!
//! Shared identifiers, access tiers, audit records and error handling used
//! across all SecretVault components.

pub mod error;
pub mod types;

// Re-export core types for convenience
pub use error::{Result, VaultError};
pub use types::{
    AccessGrant, CallerId, CategoryId, GovernanceAction, GovernanceEvent, RevealOutcome,
    RevealRecord, RevealTarget, Tier,
};
