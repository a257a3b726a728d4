//! SecretVault Ledger
//!
//! Confidential treasury ledger: encrypted category balances, a
//! deny-by-default access registry, proof-gated reveals and percentage
//! rebalancing in the ciphertext domain.
//!
//! # Example
//!
//! ```
//! use rand::rngs::OsRng;
//! use secretvault_cipher::ElGamalRevealKey;
//! use secretvault_ledger::{ConfidentialLedger, LedgerConfig, TargetAllocation};
//! use secretvault_runtime::{CallerId, CategoryId};
//! use secretvault_verifier::VerifierAuthority;
//!
//! let gov = CallerId::new("multisig");
//! let mut config = LedgerConfig::dao_default(gov.clone());
//! config.reveal_bound_bits = 20;
//! config.depositors.push(CallerId::new("payroll"));
//!
//! let authority = VerifierAuthority::generate(&mut OsRng);
//! let key = ElGamalRevealKey::generate(&mut OsRng, config.reveal_bound_bits).unwrap();
//! let amount = key.encryption_key().encrypt(500, &mut OsRng);
//!
//! let mut ledger = ConfidentialLedger::new(authority.verifying_key(), key, &config).unwrap();
//! ledger.deposit(&CallerId::new("payroll"), &CategoryId::new("Development"), &amount).unwrap();
//!
//! let split = TargetAllocation::parse(
//!     "Development=40,Operations=20,Marketing=15,Reserve Fund=20,Governance=5",
//! )
//! .unwrap();
//! ledger.rebalance(&gov, &split).unwrap();
//! ```

pub mod allocation;
pub mod config;
pub mod ledger;
pub mod registry;
pub mod store;

pub use allocation::{TargetAllocation, ALLOCATION_SCALE};
pub use config::{CategoryConfig, LedgerConfig};
pub use ledger::{
    Category, CategoryView, ConfidentialLedger, Disclosure, LedgerState, RevealedAmount,
};
pub use registry::{AccessRegistry, DepositPolicy, DepositorAllowlist};
pub use store::StateStore;
