//! Proof-nonce table: (caller, target) → last consumed nonce

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use secretvault_runtime::{CallerId, RevealTarget};

/// Persisted row of the nonce table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceEntry {
    pub caller: CallerId,
    pub target: RevealTarget,
    pub last_consumed: u64,
}

/// Highest consumed nonce per (caller, target)
///
/// A nonce is fresh only when it is strictly greater than the last consumed
/// one, so consumed proofs and older proofs are both replays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NonceEntry>", into = "Vec<NonceEntry>")]
pub struct NonceTable {
    consumed: BTreeMap<(CallerId, RevealTarget), u64>,
}

impl NonceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_consumed(&self, caller: &CallerId, target: &RevealTarget) -> Option<u64> {
        self.consumed.get(&(caller.clone(), target.clone())).copied()
    }

    pub fn is_fresh(&self, caller: &CallerId, target: &RevealTarget, nonce: u64) -> bool {
        self.last_consumed(caller, target).map_or(true, |last| nonce > last)
    }

    /// Mark `nonce` consumed; never moves the watermark backwards
    pub fn consume(&mut self, caller: &CallerId, target: &RevealTarget, nonce: u64) {
        let slot = self.consumed.entry((caller.clone(), target.clone())).or_insert(nonce);
        *slot = (*slot).max(nonce);
    }

    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}

impl From<Vec<NonceEntry>> for NonceTable {
    fn from(entries: Vec<NonceEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.consume(&entry.caller, &entry.target, entry.last_consumed);
        }
        table
    }
}

impl From<NonceTable> for Vec<NonceEntry> {
    fn from(table: NonceTable) -> Self {
        table
            .consumed
            .into_iter()
            .map(|((caller, target), last_consumed)| NonceEntry { caller, target, last_consumed })
            .collect()
    }
}
