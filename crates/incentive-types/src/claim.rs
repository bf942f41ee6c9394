//! Per-owner claim records.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Denom, RewardCategory};

/// Unclaimed reward and last-observed index snapshots for one owner in one
/// reward category.
///
/// Both maps are ordered so that serialized records are byte-identical on
/// every node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub owner: Address,
    pub category: RewardCategory,
    /// Global index value last folded into `unclaimed`, per denom.
    pub reward_indexes: BTreeMap<Denom, Decimal>,
    /// Accrued but not yet settled reward, per denom.
    pub unclaimed: BTreeMap<Denom, u64>,
}

impl ClaimRecord {
    /// A zero-balance record with no index snapshots.
    pub fn new(owner: Address, category: RewardCategory) -> Self {
        Self {
            owner,
            category,
            reward_indexes: BTreeMap::new(),
            unclaimed: BTreeMap::new(),
        }
    }

    /// Whether an index snapshot exists for `denom`.
    pub fn tracks(&self, denom: &str) -> bool {
        self.reward_indexes.contains_key(denom)
    }

    pub fn unclaimed_for(&self, denom: &str) -> u64 {
        self.unclaimed.get(denom).copied().unwrap_or(0)
    }

    /// True when every denom balance is zero (or none exist).
    pub fn has_nothing_to_claim(&self) -> bool {
        self.unclaimed.values().all(|amount| *amount == 0)
    }

    /// Denoms with a positive unclaimed balance, in key order.
    pub fn claimable(&self) -> impl Iterator<Item = (&Denom, u64)> {
        self.unclaimed
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(denom, amount)| (denom, *amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_empty() {
        let rec = ClaimRecord::new(Address::new(vec![1]), RewardCategory::HardSupply);
        assert!(rec.has_nothing_to_claim());
        assert!(!rec.tracks("usdc"));
        assert_eq!(rec.unclaimed_for("usdc"), 0);
    }

    #[test]
    fn test_claimable_skips_zero_balances() {
        let mut rec = ClaimRecord::new(Address::new(vec![1]), RewardCategory::HardSupply);
        rec.unclaimed.insert("bnb".to_string(), 0);
        rec.unclaimed.insert("usdc".to_string(), 7);
        let claimable: Vec<_> = rec.claimable().collect();
        assert_eq!(claimable, vec![(&"usdc".to_string(), 7)]);
        assert!(!rec.has_nothing_to_claim());
    }
}
