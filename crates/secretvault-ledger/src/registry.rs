//! Access control registry
//!
//! Flat (caller, target) → tier table with an explicit default: any pair
//! without a grant is `Restricted`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use secretvault_runtime::{AccessGrant, CallerId, CategoryId, Result, RevealTarget, Tier, VaultError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AccessGrant>", into = "Vec<AccessGrant>")]
struct GrantTable(BTreeMap<(CallerId, RevealTarget), Tier>);

impl From<Vec<AccessGrant>> for GrantTable {
    fn from(grants: Vec<AccessGrant>) -> Self {
        Self(grants.into_iter().map(|g| ((g.caller, g.target), g.tier)).collect())
    }
}

impl From<GrantTable> for Vec<AccessGrant> {
    fn from(table: GrantTable) -> Self {
        table
            .0
            .into_iter()
            .map(|((caller, target), tier)| AccessGrant { caller, target, tier })
            .collect()
    }
}

/// Who may attempt which reveal
///
/// Mutations require the governance identity the registry was created with.
/// Verifying that the identity really speaks for governance (multisig,
/// voting) is the governance collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRegistry {
    governance: CallerId,
    grants: GrantTable,
}

impl AccessRegistry {
    pub fn new(governance: CallerId) -> Self {
        Self { governance, grants: GrantTable::default() }
    }

    pub fn governance(&self) -> &CallerId {
        &self.governance
    }

    /// Fail with `GovernanceRequired` unless `authority` is the governance identity
    pub fn ensure_governance(&self, authority: &CallerId) -> Result<()> {
        if *authority != self.governance {
            return Err(VaultError::governance_required(authority.as_str()));
        }
        Ok(())
    }

    pub fn grant(
        &mut self,
        authority: &CallerId,
        caller: CallerId,
        target: RevealTarget,
        tier: Tier,
    ) -> Result<()> {
        self.ensure_governance(authority)?;
        self.grants.0.insert((caller, target), tier);
        Ok(())
    }

    /// Remove a grant; returns the tier it held, if any
    pub fn revoke(
        &mut self,
        authority: &CallerId,
        caller: &CallerId,
        target: &RevealTarget,
    ) -> Result<Option<Tier>> {
        self.ensure_governance(authority)?;
        Ok(self.grants.0.remove(&(caller.clone(), target.clone())))
    }

    /// Granted tier, `Restricted` when there is no grant
    pub fn tier_of(&self, caller: &CallerId, target: &RevealTarget) -> Tier {
        self.grants.0.get(&(caller.clone(), target.clone())).copied().unwrap_or_default()
    }

    /// Granted tier capped by the target's ceiling
    pub fn effective_tier(&self, caller: &CallerId, target: &RevealTarget, ceiling: Tier) -> Tier {
        self.tier_of(caller, target).min(ceiling)
    }

    pub fn grants(&self) -> Vec<AccessGrant> {
        self.grants.clone().into()
    }

    pub fn len(&self) -> usize {
        self.grants.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.0.is_empty()
    }
}

/// Decides whether a caller may deposit into a category
///
/// Deposit rights are owned by an external collaborator; the ledger consults
/// a policy before touching any balance.
pub trait DepositPolicy {
    fn may_deposit(&self, caller: &CallerId, category: &CategoryId) -> bool;
}

/// Governance-managed set of callers allowed to deposit anywhere
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositorAllowlist(BTreeSet<CallerId>);

impl DepositorAllowlist {
    pub fn new(depositors: impl IntoIterator<Item = CallerId>) -> Self {
        Self(depositors.into_iter().collect())
    }

    /// Returns false when the caller was already allowed
    pub fn authorize(&mut self, caller: CallerId) -> bool {
        self.0.insert(caller)
    }

    /// Returns false when the caller was not allowed
    pub fn revoke(&mut self, caller: &CallerId) -> bool {
        self.0.remove(caller)
    }

    pub fn contains(&self, caller: &CallerId) -> bool {
        self.0.contains(caller)
    }
}

impl DepositPolicy for DepositorAllowlist {
    fn may_deposit(&self, caller: &CallerId, _category: &CategoryId) -> bool {
        self.contains(caller)
    }
}
