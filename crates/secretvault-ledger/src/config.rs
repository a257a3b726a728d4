//! Ledger configuration
//!
//! The governance-approved category set and the reveal parameters, loaded
//! from JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use secretvault_cipher::{DEFAULT_REVEAL_BOUND_BITS, MAX_REVEAL_BOUND_BITS};
use secretvault_runtime::{CallerId, CategoryId, Result, Tier, VaultError};

fn default_category_tier() -> Tier {
    Tier::Full
}

fn default_reveal_bound_bits() -> u32 {
    DEFAULT_REVEAL_BOUND_BITS
}

fn default_partial_granularity() -> u64 {
    100
}

/// One category of the initial category set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub id: CategoryId,
    pub percentage: u8,
    /// Tier ceiling applied on top of every caller's grant
    #[serde(default = "default_category_tier")]
    pub tier: Tier,
}

impl CategoryConfig {
    pub fn new(id: impl Into<String>, percentage: u8, tier: Tier) -> Self {
        Self { id: CategoryId::new(id), percentage, tier }
    }
}

/// Ledger configuration
///
/// # Examples
///
/// ```
/// use secretvault_ledger::LedgerConfig;
/// use secretvault_runtime::CallerId;
///
/// let config = LedgerConfig::dao_default(CallerId::new("multisig"));
/// assert!(config.validate().is_ok());
/// assert_eq!(config.categories.len(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Identity of the governance authority
    pub governance: CallerId,
    pub categories: Vec<CategoryConfig>,
    /// Tier ceiling of the treasury total
    #[serde(default)]
    pub total_tier: Tier,
    /// Balances up to 2^bits allocation units can be revealed
    #[serde(default = "default_reveal_bound_bits")]
    pub reveal_bound_bits: u32,
    /// Partial reveals are floored to a multiple of this many whole units
    #[serde(default = "default_partial_granularity")]
    pub partial_granularity: u64,
    #[serde(default)]
    pub depositors: Vec<CallerId>,
}

impl LedgerConfig {
    pub fn new(governance: CallerId, categories: Vec<CategoryConfig>) -> Self {
        Self {
            governance,
            categories,
            total_tier: Tier::Restricted,
            reveal_bound_bits: DEFAULT_REVEAL_BOUND_BITS,
            partial_granularity: default_partial_granularity(),
            depositors: Vec::new(),
        }
    }

    /// The five-way DAO split: development, operations, marketing, reserve
    /// and governance
    pub fn dao_default(governance: CallerId) -> Self {
        Self::new(
            governance,
            vec![
                CategoryConfig::new("Development", 35, Tier::Full),
                CategoryConfig::new("Operations", 23, Tier::Partial),
                CategoryConfig::new("Marketing", 15, Tier::Full),
                CategoryConfig::new("Reserve Fund", 20, Tier::Restricted),
                CategoryConfig::new("Governance", 7, Tier::Full),
            ],
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(VaultError::invalid_config("at least one category is required"));
        }

        let mut seen = BTreeSet::new();
        for category in &self.categories {
            if category.id.as_str().trim().is_empty() {
                return Err(VaultError::invalid_config("category id must not be empty"));
            }
            if !seen.insert(&category.id) {
                return Err(VaultError::invalid_config(format!(
                    "duplicate category '{}'",
                    category.id
                )));
            }
            if category.percentage > 100 {
                return Err(VaultError::invalid_config(format!(
                    "category '{}' has percentage {} above 100",
                    category.id, category.percentage
                )));
            }
        }

        let sum: u32 = self.categories.iter().map(|c| u32::from(c.percentage)).sum();
        if sum != 100 {
            return Err(VaultError::invalid_config(format!(
                "category percentages sum to {}, expected 100",
                sum
            )));
        }

        if self.reveal_bound_bits == 0 || self.reveal_bound_bits > MAX_REVEAL_BOUND_BITS {
            return Err(VaultError::invalid_config(format!(
                "reveal_bound_bits must be between 1 and {}",
                MAX_REVEAL_BOUND_BITS
            )));
        }

        if self.partial_granularity == 0 {
            return Err(VaultError::invalid_config("partial_granularity must be at least 1"));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VaultError::serialization_error(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::serialization_error(format!("config: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
