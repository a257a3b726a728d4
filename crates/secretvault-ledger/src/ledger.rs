//! Confidential ledger
//!
//! Owns the encrypted category balances and every piece of persisted state:
//! grants, depositors, consumed nonces and the two audit logs. All mutation
//! goes through the entry points below, each of which either commits fully or
//! returns an error with the state untouched. Reveal attempts are the one
//! exception: a failed attempt still appends its audit record.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use secretvault_cipher::{ContextId, ElGamalRevealKey, EncryptedValue, RevealKey};
use secretvault_runtime::{
    CallerId, CategoryId, GovernanceAction, GovernanceEvent, Result, RevealOutcome, RevealRecord,
    RevealTarget, Tier, VaultError,
};
use secretvault_verifier::{NonceTable, RevealProof, VerifierGateway, VerifyingKey};

use crate::allocation::{rebalance_deltas, sum_encrypted, TargetAllocation, ALLOCATION_SCALE};
use crate::config::LedgerConfig;
use crate::registry::{AccessRegistry, DepositPolicy, DepositorAllowlist};

/// One treasury category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category<V> {
    pub id: CategoryId,
    /// Encrypted balance in allocation units
    pub balance: V,
    pub percentage: u8,
    /// Ceiling on every caller's tier for this category
    pub tier: Tier,
    /// Block marker of the last balance change
    pub last_updated: u64,
}

/// Everything the ledger persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState<V> {
    pub context: ContextId,
    pub verifying_key: VerifyingKey,
    pub block: u64,
    pub categories: Vec<Category<V>>,
    pub total_tier: Tier,
    pub partial_granularity: u64,
    pub registry: AccessRegistry,
    pub depositors: DepositorAllowlist,
    pub nonces: NonceTable,
    pub reveal_log: Vec<RevealRecord>,
    pub governance_log: Vec<GovernanceEvent>,
}

/// A revealed amount, in allocation units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAmount {
    pub scaled: u64,
}

impl RevealedAmount {
    pub fn units(&self) -> u64 {
        self.scaled / ALLOCATION_SCALE
    }

    pub fn hundredths(&self) -> u64 {
        self.scaled % ALLOCATION_SCALE
    }
}

impl fmt::Display for RevealedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.units(), self.hundredths())
    }
}

/// Value handed to the caller by a granted reveal
///
/// For a `Partial` tier `amount` is the floored value, never the raw balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    pub target: RevealTarget,
    pub tier: Tier,
    pub amount: RevealedAmount,
    pub block: u64,
}

/// Dashboard row of [`ConfidentialLedger::allocation_snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView<V> {
    pub id: CategoryId,
    pub percentage: u8,
    /// Viewer's effective tier
    pub tier: Tier,
    pub last_updated: u64,
    /// Present only when the viewer is not restricted
    pub balance: Option<V>,
}

/// Category-partitioned encrypted treasury with proof-gated reveals
pub struct ConfidentialLedger<K: RevealKey = ElGamalRevealKey> {
    state: LedgerState<K::Value>,
    gateway: VerifierGateway,
    reveal_key: K,
}

impl<K: RevealKey> ConfidentialLedger<K> {
    /// Fresh ledger with every category at an encrypted zero
    pub fn new(verifying_key: VerifyingKey, reveal_key: K, config: &LedgerConfig) -> Result<Self> {
        config.validate()?;

        let categories = config
            .categories
            .iter()
            .map(|c| Category {
                id: c.id.clone(),
                balance: reveal_key.zero(),
                percentage: c.percentage,
                tier: c.tier,
                last_updated: 0,
            })
            .collect();

        let state = LedgerState {
            context: *reveal_key.context(),
            verifying_key,
            block: 0,
            categories,
            total_tier: config.total_tier,
            partial_granularity: config.partial_granularity,
            registry: AccessRegistry::new(config.governance.clone()),
            depositors: DepositorAllowlist::new(config.depositors.iter().cloned()),
            nonces: NonceTable::new(),
            reveal_log: Vec::new(),
            governance_log: Vec::new(),
        };

        info!(
            context = %state.context,
            categories = state.categories.len(),
            governance = %config.governance,
            "ledger initialized"
        );

        Ok(Self { gateway: VerifierGateway::new(verifying_key), state, reveal_key })
    }

    /// Restore a ledger from persisted state
    ///
    /// Fails with `ContextMismatch` when `reveal_key` does not belong to the
    /// state's context.
    pub fn from_state(state: LedgerState<K::Value>, reveal_key: K) -> Result<Self> {
        reveal_key.context().ensure_matches(&state.context)?;
        for category in &state.categories {
            reveal_key.ensure_context(&category.balance)?;
        }

        Ok(Self { gateway: VerifierGateway::new(state.verifying_key), state, reveal_key })
    }

    pub fn state(&self) -> &LedgerState<K::Value> {
        &self.state
    }

    pub fn into_state(self) -> LedgerState<K::Value> {
        self.state
    }

    pub fn context(&self) -> &ContextId {
        &self.state.context
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.gateway.verifying_key()
    }

    pub fn governance(&self) -> &CallerId {
        self.state.registry.governance()
    }

    /// Current operation marker
    pub fn block(&self) -> u64 {
        self.state.block
    }

    pub fn categories(&self) -> &[Category<K::Value>] {
        &self.state.categories
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category<K::Value>> {
        self.state.categories.iter().find(|c| c.id == *id)
    }

    pub fn reveal_log(&self) -> &[RevealRecord] {
        &self.state.reveal_log
    }

    pub fn governance_log(&self) -> &[GovernanceEvent] {
        &self.state.governance_log
    }

    pub fn is_depositor(&self, caller: &CallerId) -> bool {
        self.state.depositors.contains(caller)
    }

    fn category_index(&self, id: &CategoryId) -> Result<usize> {
        self.state
            .categories
            .iter()
            .position(|c| c.id == *id)
            .ok_or_else(|| VaultError::category_unknown(id.as_str()))
    }

    fn ensure_target_exists(&self, target: &RevealTarget) -> Result<()> {
        if let RevealTarget::Category(id) = target {
            self.category_index(id)?;
        }
        Ok(())
    }

    fn next_block(&mut self) -> u64 {
        self.state.block += 1;
        self.state.block
    }

    fn record_governance(&mut self, authority: &CallerId, action: GovernanceAction) -> u64 {
        let block = self.next_block();
        self.state.governance_log.push(GovernanceEvent {
            block,
            authority: authority.clone(),
            action,
        });
        block
    }

    // Deposits and balance movements

    /// Add an encrypted amount (whole units) to a category
    ///
    /// Checks, in order: depositor allow-list (`UnauthorizedDepositor`),
    /// category (`CategoryUnknown`), encryption context (`ContextMismatch`).
    pub fn deposit(&mut self, caller: &CallerId, category: &CategoryId, amount: &K::Value) -> Result<()> {
        if !self.state.depositors.may_deposit(caller, category) {
            return Err(VaultError::unauthorized_depositor(caller.as_str()));
        }
        self.apply_deposit(caller, category, amount)
    }

    /// [`deposit`](Self::deposit) with deposit rights decided by an external policy
    pub fn deposit_with_policy(
        &mut self,
        policy: &dyn DepositPolicy,
        caller: &CallerId,
        category: &CategoryId,
        amount: &K::Value,
    ) -> Result<()> {
        if !policy.may_deposit(caller, category) {
            return Err(VaultError::unauthorized_depositor(caller.as_str()));
        }
        self.apply_deposit(caller, category, amount)
    }

    fn apply_deposit(&mut self, caller: &CallerId, category: &CategoryId, amount: &K::Value) -> Result<()> {
        let index = self.category_index(category)?;
        self.reveal_key.ensure_context(amount)?;

        let updated = self.state.categories[index].balance.add(&amount.scalar_mul(ALLOCATION_SCALE))?;

        let block = self.next_block();
        let entry = &mut self.state.categories[index];
        entry.balance = updated;
        entry.last_updated = block;

        info!(%caller, %category, block, "deposit applied");
        Ok(())
    }

    /// Move an encrypted amount (whole units) between two categories
    ///
    /// Sum-neutral. The source balance is not range-checked, so moving more
    /// than it holds leaves a balance that fails to decrypt.
    pub fn reallocate(
        &mut self,
        governance: &CallerId,
        from: &CategoryId,
        to: &CategoryId,
        amount: &K::Value,
    ) -> Result<()> {
        self.state.registry.ensure_governance(governance)?;
        let from_index = self.category_index(from)?;
        let to_index = self.category_index(to)?;
        self.reveal_key.ensure_context(amount)?;

        if from_index == to_index {
            debug!(category = %from, "reallocation to the same category ignored");
            return Ok(());
        }

        let scaled = amount.scalar_mul(ALLOCATION_SCALE);
        let new_from = self.state.categories[from_index].balance.sub(&scaled)?;
        let new_to = self.state.categories[to_index].balance.add(&scaled)?;

        let block = self.record_governance(
            governance,
            GovernanceAction::Reallocate { from: from.clone(), to: to.clone() },
        );
        for (index, balance) in [(from_index, new_from), (to_index, new_to)] {
            let entry = &mut self.state.categories[index];
            entry.balance = balance;
            entry.last_updated = block;
        }

        info!(%from, %to, block, "reallocation applied");
        Ok(())
    }

    /// Governance-authorized withdrawal of an encrypted amount (whole units)
    pub fn withdraw(&mut self, governance: &CallerId, category: &CategoryId, amount: &K::Value) -> Result<()> {
        self.state.registry.ensure_governance(governance)?;
        let index = self.category_index(category)?;
        self.reveal_key.ensure_context(amount)?;

        let updated = self.state.categories[index].balance.sub(&amount.scalar_mul(ALLOCATION_SCALE))?;

        let block = self
            .record_governance(governance, GovernanceAction::Withdraw { category: category.clone() });
        let entry = &mut self.state.categories[index];
        entry.balance = updated;
        entry.last_updated = block;

        info!(%category, block, "withdrawal applied");
        Ok(())
    }

    /// Move every balance to its share of the total and adopt `target`
    ///
    /// `AllocationInvalid` (state untouched) unless `target` names every
    /// category exactly once and sums to 100.
    pub fn rebalance(&mut self, governance: &CallerId, target: &TargetAllocation) -> Result<()> {
        self.state.registry.ensure_governance(governance)?;
        target.validate(self.state.categories.iter().map(|c| &c.id))?;

        let total = self.total_balance()?;
        let balances: Vec<_> = self.state.categories.iter().map(|c| (&c.id, &c.balance)).collect();
        let deltas = rebalance_deltas(&balances, &total, target)?;

        let updated = self
            .state
            .categories
            .iter()
            .zip(&deltas)
            .map(|(c, delta)| c.balance.add(delta))
            .collect::<Result<Vec<_>>>()?;

        let block = self.record_governance(
            governance,
            GovernanceAction::Rebalance { percentages: target.percentages().to_vec() },
        );
        for (entry, balance) in self.state.categories.iter_mut().zip(updated) {
            entry.percentage = target.percentage_of(&entry.id).unwrap_or(entry.percentage);
            entry.balance = balance;
            entry.last_updated = block;
        }

        info!(block, categories = self.state.categories.len(), "rebalance applied");
        Ok(())
    }

    /// Homomorphic sum of all category balances
    pub fn total_balance(&self) -> Result<K::Value> {
        sum_encrypted(self.reveal_key.zero(), self.state.categories.iter().map(|c| &c.balance))
    }

    // Reveals

    fn ceiling_of(&self, target: &RevealTarget) -> Tier {
        match target {
            RevealTarget::Total => self.state.total_tier,
            RevealTarget::Category(id) => {
                self.category(id).map(|c| c.tier).unwrap_or(Tier::Restricted)
            }
        }
    }

    /// Granted tier, `Restricted` when there is no grant
    pub fn tier_of(&self, caller: &CallerId, target: &RevealTarget) -> Tier {
        self.state.registry.tier_of(caller, target)
    }

    /// Granted tier capped by the target's ceiling; unknown targets are `Restricted`
    pub fn effective_tier(&self, caller: &CallerId, target: &RevealTarget) -> Tier {
        self.state.registry.effective_tier(caller, target, self.ceiling_of(target))
    }

    /// Disclose one value to `caller` if their tier and proof allow it
    ///
    /// A `Restricted` effective tier fails with `AccessDenied` before the
    /// proof is looked at. Otherwise the gateway checks the proof; on success
    /// the value is decrypted and the proof nonce consumed together with the
    /// granted record. Every attempt advances the block marker and is
    /// recorded, whatever its outcome.
    pub fn request_reveal(
        &mut self,
        target: &RevealTarget,
        caller: &CallerId,
        proof: &RevealProof,
    ) -> Result<Disclosure> {
        let tier = self.effective_tier(caller, target);
        let block = self.next_block();

        if tier == Tier::Restricted {
            self.record_reveal(target, caller, block, RevealOutcome::AccessDenied);
            warn!(%caller, %target, block, "reveal denied by tier");
            return Err(VaultError::AccessDenied);
        }

        let nonce = match self.gateway.verify(proof, caller, target, &self.state.nonces) {
            Ok(nonce) => nonce,
            Err(e) => {
                self.record_reveal(target, caller, block, RevealOutcome::ProofRejected);
                warn!(%caller, %target, block, error = %e, "reveal proof rejected");
                return Err(e);
            }
        };

        let scaled = match self.decrypt_target(target) {
            Ok(scaled) => scaled,
            Err(e) => {
                self.record_reveal(target, caller, block, RevealOutcome::Failed);
                warn!(%caller, %target, block, error = %e, "reveal failed after verification");
                return Err(e);
            }
        };

        let scaled = match tier {
            Tier::Partial => {
                let step = self.state.partial_granularity.max(1).saturating_mul(ALLOCATION_SCALE);
                scaled - scaled % step
            }
            _ => scaled,
        };

        self.state.nonces.consume(caller, target, nonce);
        self.record_reveal(target, caller, block, RevealOutcome::Granted);
        info!(%caller, %target, %tier, block, "reveal granted");

        Ok(Disclosure { target: target.clone(), tier, amount: RevealedAmount { scaled }, block })
    }

    fn decrypt_target(&self, target: &RevealTarget) -> Result<u64> {
        match target {
            RevealTarget::Total => self.reveal_key.decrypt(&self.total_balance()?),
            RevealTarget::Category(id) => {
                let index = self.category_index(id)?;
                self.reveal_key.decrypt(&self.state.categories[index].balance)
            }
        }
    }

    fn record_reveal(&mut self, target: &RevealTarget, caller: &CallerId, block: u64, outcome: RevealOutcome) {
        self.state.reveal_log.push(RevealRecord {
            target: target.clone(),
            caller: caller.clone(),
            block,
            outcome,
        });
    }

    /// Per-category dashboard view for `viewer`
    ///
    /// Ciphertexts are withheld from categories the viewer is restricted on.
    pub fn allocation_snapshot(&self, viewer: &CallerId) -> Vec<CategoryView<K::Value>> {
        self.state
            .categories
            .iter()
            .map(|c| {
                let tier = self.state.registry.effective_tier(
                    viewer,
                    &RevealTarget::Category(c.id.clone()),
                    c.tier,
                );
                CategoryView {
                    id: c.id.clone(),
                    percentage: c.percentage,
                    tier,
                    last_updated: c.last_updated,
                    balance: (tier != Tier::Restricted).then(|| c.balance.clone()),
                }
            })
            .collect()
    }

    // Governance

    pub fn grant(&mut self, governance: &CallerId, caller: CallerId, target: RevealTarget, tier: Tier) -> Result<()> {
        self.state.registry.ensure_governance(governance)?;
        self.ensure_target_exists(&target)?;

        self.state.registry.grant(governance, caller.clone(), target.clone(), tier)?;
        let block = self.record_governance(governance, GovernanceAction::Grant { caller, target, tier });

        info!(block, %tier, "access granted");
        Ok(())
    }

    /// Remove a grant; returns the tier it held, if any
    pub fn revoke(&mut self, governance: &CallerId, caller: &CallerId, target: &RevealTarget) -> Result<Option<Tier>> {
        let previous = self.state.registry.revoke(governance, caller, target)?;
        let block = self.record_governance(
            governance,
            GovernanceAction::Revoke { caller: caller.clone(), target: target.clone() },
        );

        info!(block, %caller, %target, "access revoked");
        Ok(previous)
    }

    /// Change the tier ceiling of a category or of the total
    pub fn set_tier_ceiling(&mut self, governance: &CallerId, target: &RevealTarget, tier: Tier) -> Result<()> {
        self.state.registry.ensure_governance(governance)?;
        match target {
            RevealTarget::Total => self.state.total_tier = tier,
            RevealTarget::Category(id) => {
                let index = self.category_index(id)?;
                self.state.categories[index].tier = tier;
            }
        }

        let block = self.record_governance(
            governance,
            GovernanceAction::SetTierCeiling { target: target.clone(), tier },
        );
        info!(block, %target, %tier, "tier ceiling changed");
        Ok(())
    }

    /// Returns false when the caller was already a depositor
    pub fn authorize_depositor(&mut self, governance: &CallerId, caller: CallerId) -> Result<bool> {
        self.state.registry.ensure_governance(governance)?;
        let added = self.state.depositors.authorize(caller.clone());
        let block = self.record_governance(governance, GovernanceAction::AuthorizeDepositor { caller });

        info!(block, added, "depositor authorized");
        Ok(added)
    }

    /// Returns false when the caller was not a depositor
    pub fn revoke_depositor(&mut self, governance: &CallerId, caller: &CallerId) -> Result<bool> {
        self.state.registry.ensure_governance(governance)?;
        let removed = self.state.depositors.revoke(caller);
        let block = self.record_governance(
            governance,
            GovernanceAction::RevokeDepositor { caller: caller.clone() },
        );

        info!(block, removed, "depositor revoked");
        Ok(removed)
    }

    /// Replace the verifier authority key
    pub fn rotate_verifier(&mut self, governance: &CallerId, verifying_key: VerifyingKey) -> Result<()> {
        self.state.registry.ensure_governance(governance)?;
        let previous = self.gateway.rotate(verifying_key);
        self.state.verifying_key = verifying_key;

        self.record_governance(
            governance,
            GovernanceAction::RotateVerifier { previous: previous.to_hex(), next: verifying_key.to_hex() },
        );
        Ok(())
    }
}

impl<K: RevealKey + fmt::Debug> fmt::Debug for ConfidentialLedger<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfidentialLedger")
            .field("context", &self.state.context)
            .field("block", &self.state.block)
            .field("categories", &self.state.categories.len())
            .field("reveal_key", &self.reveal_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryConfig;
    use rand::rngs::OsRng;
    use secretvault_verifier::VerifierAuthority;

    struct Fixture {
        ledger: ConfidentialLedger,
        authority: VerifierAuthority,
        gov: CallerId,
        depositor: CallerId,
    }

    fn fixture() -> Fixture {
        let gov = CallerId::new("multisig");
        let depositor = CallerId::new("payroll");
        let mut config = LedgerConfig::new(
            gov.clone(),
            vec![CategoryConfig::new("A", 60, Tier::Full), CategoryConfig::new("B", 40, Tier::Partial)],
        );
        config.reveal_bound_bits = 24;
        config.depositors = vec![depositor.clone()];

        let authority = VerifierAuthority::generate(&mut OsRng);
        let key = ElGamalRevealKey::generate(&mut OsRng, config.reveal_bound_bits).unwrap();
        let ledger = ConfidentialLedger::new(authority.verifying_key(), key, &config).unwrap();

        Fixture { ledger, authority, gov, depositor }
    }

    fn encrypt(f: &Fixture, amount: u64) -> secretvault_cipher::ElGamalCiphertext {
        f.ledger.reveal_key.encryption_key().encrypt(amount, &mut OsRng)
    }

    fn plain(f: &Fixture, id: &str) -> u64 {
        let category = f.ledger.category(&CategoryId::new(id)).unwrap();
        f.ledger.reveal_key.decrypt(&category.balance).unwrap()
    }

    #[test]
    fn test_new_ledger_is_zeroed() {
        let f = fixture();
        assert_eq!(f.ledger.block(), 0);
        for category in f.ledger.categories() {
            assert!(f.ledger.reveal_key.is_zero(&category.balance).unwrap());
        }
    }

    #[test]
    fn test_deposit_scales_to_allocation_units() {
        let mut f = fixture();
        let amount = encrypt(&f, 250);
        let (depositor, a) = (f.depositor.clone(), CategoryId::new("A"));

        f.ledger.deposit(&depositor, &a, &amount).unwrap();
        assert_eq!(plain(&f, "A"), 250 * ALLOCATION_SCALE);
        assert_eq!(f.ledger.category(&a).unwrap().last_updated, 1);
    }

    #[test]
    fn test_deposit_check_order() {
        let mut f = fixture();
        let amount = encrypt(&f, 10);
        let stranger = CallerId::new("stranger");
        let unknown = CategoryId::new("Z");

        let err = f.ledger.deposit(&stranger, &unknown, &amount).unwrap_err();
        assert!(matches!(err, VaultError::UnauthorizedDepositor(_)));

        let err = f.ledger.deposit(&f.depositor.clone(), &unknown, &amount).unwrap_err();
        assert!(matches!(err, VaultError::CategoryUnknown(_)));

        let other = ElGamalRevealKey::generate(&mut OsRng, 8).unwrap();
        let foreign = other.encryption_key().encrypt(10, &mut OsRng);
        let err = f.ledger.deposit(&f.depositor.clone(), &CategoryId::new("A"), &foreign).unwrap_err();
        assert!(matches!(err, VaultError::ContextMismatch { .. }));

        assert_eq!(f.ledger.block(), 0);
    }

    #[test]
    fn test_deposit_with_external_policy() {
        struct OnlyA;
        impl DepositPolicy for OnlyA {
            fn may_deposit(&self, _caller: &CallerId, category: &CategoryId) -> bool {
                category.as_str() == "A"
            }
        }

        let mut f = fixture();
        let amount = encrypt(&f, 5);
        let anyone = CallerId::new("anyone");

        f.ledger.deposit_with_policy(&OnlyA, &anyone, &CategoryId::new("A"), &amount).unwrap();
        let err = f
            .ledger
            .deposit_with_policy(&OnlyA, &anyone, &CategoryId::new("B"), &amount)
            .unwrap_err();
        assert!(matches!(err, VaultError::UnauthorizedDepositor(_)));
    }

    #[test]
    fn test_reallocate_requires_governance() {
        let mut f = fixture();
        let amount = encrypt(&f, 1);
        let depositor = f.depositor.clone();

        let err = f
            .ledger
            .reallocate(&depositor, &CategoryId::new("A"), &CategoryId::new("B"), &amount)
            .unwrap_err();
        assert!(matches!(err, VaultError::GovernanceRequired(_)));
    }

    #[test]
    fn test_reallocate_same_category_is_noop() {
        let mut f = fixture();
        let amount = encrypt(&f, 1);
        let gov = f.gov.clone();
        let a = CategoryId::new("A");

        f.ledger.reallocate(&gov, &a, &a, &amount).unwrap();
        assert_eq!(f.ledger.block(), 0);

        let err = f.ledger.reallocate(&gov, &a, &CategoryId::new("Z"), &amount).unwrap_err();
        assert!(matches!(err, VaultError::CategoryUnknown(_)));
    }

    #[test]
    fn test_restricted_reveal_skips_proof() {
        let mut f = fixture();
        let caller = CallerId::new("auditor");
        let target = RevealTarget::category("A");
        // Garbage signature: would fail verification if it were evaluated
        let proof = RevealProof::new(caller.clone(), target.clone(), 1, vec![0u8; 3]);

        let err = f.ledger.request_reveal(&target, &caller, &proof).unwrap_err();
        assert!(matches!(err, VaultError::AccessDenied));
        assert_eq!(f.ledger.reveal_log()[0].outcome, RevealOutcome::AccessDenied);
    }

    #[test]
    fn test_partial_reveal_is_floored() {
        let mut f = fixture();
        let (gov, depositor) = (f.gov.clone(), f.depositor.clone());
        let amount = encrypt(&f, 1234);
        let caller = CallerId::new("auditor");
        let target = RevealTarget::category("B");

        f.ledger.deposit(&depositor, &CategoryId::new("B"), &amount).unwrap();
        f.ledger.grant(&gov, caller.clone(), target.clone(), Tier::Full).unwrap();

        let proof = f.authority.issue(caller.clone(), target.clone(), 1, &mut OsRng).unwrap();
        let disclosure = f.ledger.request_reveal(&target, &caller, &proof).unwrap();

        assert_eq!(disclosure.tier, Tier::Partial);
        assert_eq!(disclosure.amount.units(), 1200);
        assert_eq!(disclosure.amount.hundredths(), 0);
    }

    #[test]
    fn test_failed_decryption_keeps_nonce() {
        let mut f = fixture();
        let (gov, depositor) = (f.gov.clone(), f.depositor.clone());
        let caller = CallerId::new("auditor");
        let target = RevealTarget::category("A");

        // Overdraw A so its balance wraps below zero
        let amount = encrypt(&f, 1);
        f.ledger.deposit(&depositor, &CategoryId::new("B"), &amount).unwrap();
        let two = encrypt(&f, 2);
        f.ledger.reallocate(&gov, &CategoryId::new("A"), &CategoryId::new("B"), &two).unwrap();
        f.ledger.grant(&gov, caller.clone(), target.clone(), Tier::Full).unwrap();

        let proof = f.authority.issue(caller.clone(), target.clone(), 1, &mut OsRng).unwrap();
        let err = f.ledger.request_reveal(&target, &caller, &proof).unwrap_err();
        assert!(matches!(err, VaultError::DecryptionOutOfRange { .. }));
        assert_eq!(f.ledger.reveal_log()[0].outcome, RevealOutcome::Failed);
        assert_eq!(f.ledger.state().nonces.last_consumed(&caller, &target), None);
    }

    #[test]
    fn test_snapshot_hides_restricted_balances() {
        let mut f = fixture();
        let gov = f.gov.clone();
        let viewer = CallerId::new("viewer");
        f.ledger.grant(&gov, viewer.clone(), RevealTarget::category("A"), Tier::Partial).unwrap();

        let snapshot = f.ledger.allocation_snapshot(&viewer);
        assert_eq!(snapshot[0].tier, Tier::Partial);
        assert!(snapshot[0].balance.is_some());
        assert_eq!(snapshot[1].tier, Tier::Restricted);
        assert!(snapshot[1].balance.is_none());
    }

    #[test]
    fn test_grant_unknown_category_rejected() {
        let mut f = fixture();
        let gov = f.gov.clone();
        let err = f
            .ledger
            .grant(&gov, CallerId::new("x"), RevealTarget::category("Z"), Tier::Full)
            .unwrap_err();
        assert!(matches!(err, VaultError::CategoryUnknown(_)));
        assert!(f.ledger.governance_log().is_empty());
    }

    #[test]
    fn test_rotate_verifier() {
        let mut f = fixture();
        let gov = f.gov.clone();
        let next = VerifierAuthority::generate(&mut OsRng);

        f.ledger.rotate_verifier(&gov, next.verifying_key()).unwrap();
        assert_eq!(*f.ledger.verifying_key(), next.verifying_key());
        assert_eq!(f.ledger.state().verifying_key, next.verifying_key());
        assert!(matches!(
            f.ledger.governance_log()[0].action,
            GovernanceAction::RotateVerifier { .. }
        ));

        let err = f.ledger.rotate_verifier(&CallerId::new("x"), f.authority.verifying_key()).unwrap_err();
        assert!(matches!(err, VaultError::GovernanceRequired(_)));
    }

    #[test]
    fn test_from_state_rejects_foreign_key() {
        let f = fixture();
        let state = f.ledger.into_state();
        let other = ElGamalRevealKey::generate(&mut OsRng, 8).unwrap();

        let err = ConfidentialLedger::from_state(state, other).unwrap_err();
        assert!(matches!(err, VaultError::ContextMismatch { .. }));
    }

    #[test]
    fn test_revealed_amount_display() {
        let amount = RevealedAmount { scaled: 123_405 };
        assert_eq!(amount.units(), 1234);
        assert_eq!(amount.hundredths(), 5);
        assert_eq!(amount.to_string(), "1234.05");
    }
}
