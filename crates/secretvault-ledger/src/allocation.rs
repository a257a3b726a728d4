//! Allocation manager
//!
//! Keeps the percentage split across categories and computes the encrypted
//! deltas that move every balance to its share of the total. All arithmetic
//! stays in the ciphertext domain.
//!
//! Balances are held in allocation units of 1/[`ALLOCATION_SCALE`] of a
//! deposited unit. The total is therefore always a multiple of the scale,
//! so `total · pct / 100` is exact and the shares add back up to the total.

use std::collections::BTreeSet;

use secretvault_cipher::EncryptedValue;
use secretvault_runtime::{CategoryId, Result, VaultError};

/// Allocation units per deposited unit
pub const ALLOCATION_SCALE: u64 = 100;

/// Requested percentage per category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAllocation {
    percentages: Vec<(CategoryId, u8)>,
}

impl TargetAllocation {
    pub fn new(percentages: Vec<(CategoryId, u8)>) -> Self {
        Self { percentages }
    }

    /// Parse `"Development=50,Operations=50"`
    pub fn parse(s: &str) -> Result<Self> {
        let mut percentages = Vec::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (id, pct) = part.rsplit_once('=').ok_or_else(|| {
                VaultError::allocation_invalid(format!("expected CATEGORY=PERCENT, got '{}'", part))
            })?;
            let pct: u8 = pct.trim().parse().map_err(|_| {
                VaultError::allocation_invalid(format!("invalid percentage in '{}'", part))
            })?;
            percentages.push((CategoryId::new(id.trim()), pct));
        }

        Ok(Self { percentages })
    }

    pub fn percentages(&self) -> &[(CategoryId, u8)] {
        &self.percentages
    }

    pub fn percentage_of(&self, id: &CategoryId) -> Option<u8> {
        self.percentages.iter().find(|(c, _)| c == id).map(|(_, pct)| *pct)
    }

    /// Every category named exactly once, nothing else, summing to 100
    pub fn validate<'a>(&self, categories: impl IntoIterator<Item = &'a CategoryId>) -> Result<()> {
        let expected: BTreeSet<&CategoryId> = categories.into_iter().collect();
        let mut seen = BTreeSet::new();

        for (id, _) in &self.percentages {
            if !expected.contains(id) {
                return Err(VaultError::allocation_invalid(format!("unknown category '{}'", id)));
            }
            if !seen.insert(id) {
                return Err(VaultError::allocation_invalid(format!("category '{}' listed twice", id)));
            }
        }

        if let Some(missing) = expected.iter().find(|id| !seen.contains(*id)) {
            return Err(VaultError::allocation_invalid(format!("missing category '{}'", missing)));
        }

        let sum: u32 = self.percentages.iter().map(|(_, pct)| u32::from(*pct)).sum();
        if sum != 100 {
            return Err(VaultError::allocation_invalid(format!(
                "percentages sum to {}, expected 100",
                sum
            )));
        }

        Ok(())
    }
}

/// Homomorphic sum of `values`, starting from `zero`
pub fn sum_encrypted<'a, V: EncryptedValue + 'a>(
    zero: V,
    values: impl IntoIterator<Item = &'a V>,
) -> Result<V> {
    values.into_iter().try_fold(zero, |acc, v| acc.add(v))
}

/// Encrypted deltas moving each balance to `total · pct / 100`
///
/// `balances` must already be validated against `target`. The returned
/// deltas are in the same order as `balances`.
pub fn rebalance_deltas<V: EncryptedValue>(
    balances: &[(&CategoryId, &V)],
    total: &V,
    target: &TargetAllocation,
) -> Result<Vec<V>> {
    balances
        .iter()
        .map(|(id, balance)| {
            let pct = target
                .percentage_of(id)
                .ok_or_else(|| VaultError::allocation_invalid(format!("missing category '{}'", id)))?;
            let share = total.scalar_mul(u64::from(pct)).scalar_div_exact(100)?;
            share.sub(balance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use secretvault_cipher::{ElGamalRevealKey, RevealKey};

    fn ids(names: &[&str]) -> Vec<CategoryId> {
        names.iter().map(|n| CategoryId::new(*n)).collect()
    }

    #[test]
    fn test_parse() {
        let target = TargetAllocation::parse("Development=50, Reserve Fund=50").unwrap();
        assert_eq!(target.percentage_of(&CategoryId::new("Reserve Fund")), Some(50));
        assert_eq!(target.percentages().len(), 2);

        assert!(TargetAllocation::parse("A:50").is_err());
        assert!(TargetAllocation::parse("A=fifty").is_err());
        assert!(TargetAllocation::parse("A=300").is_err());
    }

    #[test]
    fn test_validate_sum() {
        let categories = ids(&["A", "B"]);

        assert!(TargetAllocation::parse("A=50,B=50").unwrap().validate(&categories).is_ok());
        for bad in ["A=50,B=49", "A=50,B=51"] {
            let err = TargetAllocation::parse(bad).unwrap().validate(&categories).unwrap_err();
            assert!(matches!(err, VaultError::AllocationInvalid(_)));
        }
    }

    #[test]
    fn test_validate_category_coverage() {
        let categories = ids(&["A", "B"]);

        assert!(TargetAllocation::parse("A=100").unwrap().validate(&categories).is_err());
        assert!(TargetAllocation::parse("A=50,C=50").unwrap().validate(&categories).is_err());
        assert!(TargetAllocation::parse("A=50,A=50").unwrap().validate(&categories).is_err());
        assert!(TargetAllocation::parse("A=0,B=100").unwrap().validate(&categories).is_ok());
    }

    #[test]
    fn test_deltas_reach_target_shares() {
        let key = ElGamalRevealKey::generate(&mut OsRng, 24).unwrap();
        let enc = key.encryption_key();
        let (a, b) = (CategoryId::new("A"), CategoryId::new("B"));

        // 1000 units, all in A, scaled to allocation units
        let bal_a = enc.encrypt(1000 * ALLOCATION_SCALE, &mut OsRng);
        let bal_b = key.zero();
        let total = sum_encrypted(key.zero(), [&bal_a, &bal_b]).unwrap();

        let target = TargetAllocation::parse("A=30,B=70").unwrap();
        let deltas = rebalance_deltas(&[(&a, &bal_a), (&b, &bal_b)], &total, &target).unwrap();

        let new_a = bal_a.add(&deltas[0]).unwrap();
        let new_b = bal_b.add(&deltas[1]).unwrap();
        assert_eq!(key.decrypt(&new_a).unwrap(), 300 * ALLOCATION_SCALE);
        assert_eq!(key.decrypt(&new_b).unwrap(), 700 * ALLOCATION_SCALE);
    }

    #[test]
    fn test_uneven_split_is_exact_in_allocation_units() {
        let key = ElGamalRevealKey::generate(&mut OsRng, 24).unwrap();
        let enc = key.encryption_key();
        let ids = ids(&["A", "B", "C"]);

        let balances = [enc.encrypt(1001 * ALLOCATION_SCALE, &mut OsRng), key.zero(), key.zero()];
        let total = sum_encrypted(key.zero(), balances.iter()).unwrap();

        let target = TargetAllocation::parse("A=33,B=33,C=34").unwrap();
        let pairs: Vec<_> = ids.iter().zip(balances.iter()).collect();
        let deltas = rebalance_deltas(&pairs, &total, &target).unwrap();

        let values: Vec<u64> = balances
            .iter()
            .zip(&deltas)
            .map(|(b, d)| key.decrypt(&b.add(d).unwrap()).unwrap())
            .collect();

        assert_eq!(values, vec![33_033, 33_033, 34_034]);
        assert_eq!(values.iter().sum::<u64>(), 1001 * ALLOCATION_SCALE);
    }
}
