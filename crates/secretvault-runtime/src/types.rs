//! Core types for SecretVault
//!
//! Identifiers, access tiers and the append-only audit records shared by the
//! verifier gateway and the confidential ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VaultError;

/// Identity of a caller (depositor, revealer or governance authority)
///
/// # Examples
///
/// ```
/// use secretvault_runtime::CallerId;
///
/// let caller = CallerId::new("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6");
/// assert_eq!(caller.as_str(), "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Identifier of a treasury category, e.g. "Operating Fund"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// What a reveal request asks for: one category or the treasury total
///
/// The total behaves as a pseudo-category with its own grants. It has no
/// balance of its own; its value is the homomorphic sum of all categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealTarget {
    Category(CategoryId),
    Total,
}

impl RevealTarget {
    pub fn category(id: impl Into<String>) -> Self {
        Self::Category(CategoryId::new(id))
    }
}

impl From<CategoryId> for RevealTarget {
    fn from(id: CategoryId) -> Self {
        Self::Category(id)
    }
}

impl fmt::Display for RevealTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(id) => write!(f, "category:{}", id),
            Self::Total => f.write_str("total"),
        }
    }
}

impl FromStr for RevealTarget {
    type Err = VaultError;

    /// `total` names the pseudo-category; anything else is a category id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VaultError::category_unknown("<empty>"));
        }
        if s.eq_ignore_ascii_case("total") {
            return Ok(Self::Total);
        }
        Ok(Self::category(s.strip_prefix("category:").unwrap_or(s)))
    }
}

/// Access tier gating reveals
///
/// Ordered from least to most permissive, so `min` of two tiers is the
/// stricter one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Reveal always rejected, regardless of proof
    Restricted,
    /// Only a derived value is revealable, never the raw balance
    Partial,
    /// Raw balance revealable with a valid proof
    Full,
}

impl Default for Tier {
    fn default() -> Self {
        Self::Restricted
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Restricted => "restricted",
            Self::Partial => "partial",
            Self::Full => "full",
        };
        f.pad(s)
    }
}

impl FromStr for Tier {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restricted" => Ok(Self::Restricted),
            "partial" => Ok(Self::Partial),
            "full" => Ok(Self::Full),
            other => Err(VaultError::invalid_config(format!("unknown tier '{}'", other))),
        }
    }
}

/// (caller, target, tier) entry of the access-grant table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub caller: CallerId,
    pub target: RevealTarget,
    pub tier: Tier,
}

/// Outcome of a reveal attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealOutcome {
    Granted,
    /// Rejected by the tier gate before any proof evaluation
    AccessDenied,
    /// Rejected by the verifier gateway
    ProofRejected,
    /// Proof accepted but the value could not be disclosed; nonce not consumed
    Failed,
}

/// Append-only audit entry for one reveal attempt
///
/// `block` is the ledger's monotonically increasing operation marker at the
/// time of the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRecord {
    pub target: RevealTarget,
    pub caller: CallerId,
    pub block: u64,
    pub outcome: RevealOutcome,
}

/// Governance action kinds recorded in the governance log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GovernanceAction {
    Grant { caller: CallerId, target: RevealTarget, tier: Tier },
    Revoke { caller: CallerId, target: RevealTarget },
    SetTierCeiling { target: RevealTarget, tier: Tier },
    AuthorizeDepositor { caller: CallerId },
    RevokeDepositor { caller: CallerId },
    Reallocate { from: CategoryId, to: CategoryId },
    Rebalance { percentages: Vec<(CategoryId, u8)> },
    Withdraw { category: CategoryId },
    RotateVerifier { previous: String, next: String },
}

/// Append-only audit entry for a governance action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceEvent {
    pub block: u64,
    pub authority: CallerId,
    pub action: GovernanceAction,
}
