//! Claim settlement.
//!
//! A claim drains every positive balance in the requested categories. Each
//! balance is split by the multiplier's payout fraction: the floor of the
//! product is transferred now, the remainder vests until
//! `height + lockup_blocks`.
//!
//! All amounts are computed before any record is written, and the caller
//! runs settlement inside a transition cache, so a claim either settles
//! every denom or changes nothing.

use incentive_db::KvStore;
use incentive_types::{
    Address, ClaimOutcome, ClaimRecord, Denom, Height, MultiplierSpec, Params, PendingPayout,
    RewardCategory, TransferInstruction,
};
use rust_decimal::Decimal;

use crate::{claims, fixed};
use crate::multiplier::MultiplierTable;
use crate::{IncentiveError, Result};

/// Split `amount` into `(payable_now, deferred)`.
///
/// `payable_now = floor(amount * payout_fraction)`, so the two parts always
/// sum to `amount`.
pub fn split_payout(amount: u64, payout_fraction: Decimal) -> Result<(u64, u64)> {
    let payable = fixed::mul_floor(amount, payout_fraction)?;
    let deferred = amount.checked_sub(payable).ok_or(IncentiveError::Overflow)?;
    Ok((payable, deferred))
}

/// Settle the owner's claims in `categories` with the named multiplier.
///
/// # Errors
///
/// - [`IncentiveError::InvalidMultiplier`] if `multiplier_name` is unknown
/// - [`IncentiveError::ClaimExpired`] if `height` is past the claim end
/// - [`IncentiveError::NothingToClaim`] if no record has a positive balance
pub fn claim_reward<S: KvStore + ?Sized>(
    store: &mut S,
    params: &Params,
    multipliers: &MultiplierTable,
    owner: &Address,
    categories: &[RewardCategory],
    multiplier_name: &str,
    height: Height,
) -> Result<ClaimOutcome> {
    let multiplier = multipliers.get(multiplier_name)?;
    if let Some(end) = params.claim_end_height {
        if height > end {
            return Err(IncentiveError::ClaimExpired { end, height });
        }
    }

    let mut records = claims::claims_for_owner(store, owner, categories)?;
    if records.iter().all(|r| r.has_nothing_to_claim()) {
        return Err(IncentiveError::NothingToClaim {
            owner: owner.clone(),
        });
    }

    let outcome = drain(&mut records, params, multiplier, height)?;
    for record in &records {
        claims::set_claim(store, record)?;
    }

    tracing::info!(
        owner = %owner,
        multiplier = %multiplier.name,
        paid = outcome.total_paid(),
        deferred = outcome.total_deferred(),
        height,
        "rewards claimed"
    );

    Ok(outcome)
}

/// Zero every positive balance and build the matching payout records.
fn drain(
    records: &mut [ClaimRecord],
    params: &Params,
    multiplier: &MultiplierSpec,
    height: Height,
) -> Result<ClaimOutcome> {
    let unlock_height = height
        .checked_add(multiplier.lockup_blocks)
        .ok_or(IncentiveError::Overflow)?;
    let mut outcome = ClaimOutcome::default();

    for record in records.iter_mut() {
        let reward_denom = &params.category(record.category).reward_denom;
        let owed: Vec<(Denom, u64)> = record
            .claimable()
            .map(|(denom, amount)| (denom.clone(), amount))
            .collect();
        for (denom, amount) in owed {
            let (payable, deferred) = split_payout(amount, multiplier.payout_fraction)?;
            if payable > 0 {
                outcome.transfers.push(TransferInstruction {
                    recipient: record.owner.clone(),
                    category: record.category,
                    denom: denom.clone(),
                    reward_denom: reward_denom.clone(),
                    amount: payable,
                });
            }
            if deferred > 0 {
                outcome.pending.push(PendingPayout {
                    owner: record.owner.clone(),
                    category: record.category,
                    denom: denom.clone(),
                    reward_denom: reward_denom.clone(),
                    amount: deferred,
                    unlock_height,
                });
            }
            record.unclaimed.insert(denom, 0);
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use incentive_db::{state_digest, MemStore};

    fn owner() -> Address {
        Address::new(vec![0x07; 20])
    }

    fn table() -> MultiplierTable {
        MultiplierTable::from_specs(&[
            MultiplierSpec::new("small", 0, Decimal::new(5, 1)),
            MultiplierSpec::new("large", 100, Decimal::new(2, 1)),
            MultiplierSpec::new("full", 0, Decimal::ONE),
        ])
        .expect("table")
    }

    fn seed(store: &mut MemStore, category: RewardCategory, balances: &[(&str, u64)]) {
        let mut claim = ClaimRecord::new(owner(), category);
        for (denom, amount) in balances {
            claim.reward_indexes.insert(denom.to_string(), Decimal::ZERO);
            claim.unclaimed.insert(denom.to_string(), *amount);
        }
        claims::set_claim(store, &claim).expect("seed");
    }

    fn load(store: &MemStore, category: RewardCategory) -> ClaimRecord {
        claims::get_claim(store, category, &owner())
            .expect("get")
            .expect("present")
    }

    #[test]
    fn test_split_payout_conserves_amount() {
        assert_eq!(split_payout(3000, Decimal::new(2, 1)).expect("split"), (600, 2400));
        assert_eq!(split_payout(7, Decimal::new(5, 1)).expect("split"), (3, 4));
        assert_eq!(split_payout(9, Decimal::ONE).expect("split"), (9, 0));
        assert_eq!(split_payout(1, Decimal::new(1, 2)).expect("split"), (0, 1));
    }

    #[test]
    fn test_large_multiplier_worked_example() {
        let mut store = MemStore::new();
        seed(&mut store, RewardCategory::HardSupply, &[("usdc", 3000)]);

        let outcome = claim_reward(
            &mut store,
            &Params::default(),
            &table(),
            &owner(),
            &[RewardCategory::HardSupply],
            "large",
            10,
        )
        .expect("claim");

        assert_eq!(outcome.transfers.len(), 1);
        assert_eq!(outcome.transfers[0].amount, 600);
        assert_eq!(outcome.transfers[0].reward_denom, "hard");
        assert_eq!(
            outcome.pending,
            vec![PendingPayout {
                owner: owner(),
                category: RewardCategory::HardSupply,
                denom: "usdc".to_string(),
                reward_denom: "hard".to_string(),
                amount: 2400,
                unlock_height: 110,
            }]
        );
        assert_eq!(load(&store, RewardCategory::HardSupply).unclaimed_for("usdc"), 0);
    }

    #[test]
    fn test_full_payout_emits_no_pending() {
        let mut store = MemStore::new();
        seed(&mut store, RewardCategory::UsdxMinting, &[("bnb-a", 500)]);

        let outcome = claim_reward(
            &mut store,
            &Params::default(),
            &table(),
            &owner(),
            &[RewardCategory::UsdxMinting],
            "FULL",
            1,
        )
        .expect("claim");
        assert_eq!(outcome.total_paid(), 500);
        assert!(outcome.pending.is_empty());
    }

    #[test]
    fn test_settles_only_requested_categories() {
        let mut store = MemStore::new();
        seed(&mut store, RewardCategory::HardSupply, &[("usdc", 10), ("bnb", 0)]);
        seed(&mut store, RewardCategory::HardBorrow, &[("usdc", 20)]);
        seed(&mut store, RewardCategory::UsdxMinting, &[("bnb-a", 30)]);

        let outcome = claim_reward(
            &mut store,
            &Params::default(),
            &table(),
            &owner(),
            &[RewardCategory::HardSupply, RewardCategory::HardBorrow],
            "small",
            1,
        )
        .expect("claim");

        assert_eq!(outcome.total_paid() + outcome.total_deferred(), 30);
        assert!(load(&store, RewardCategory::HardSupply).has_nothing_to_claim());
        assert!(load(&store, RewardCategory::HardBorrow).has_nothing_to_claim());
        assert_eq!(load(&store, RewardCategory::UsdxMinting).unclaimed_for("bnb-a"), 30);
    }

    #[test]
    fn test_unknown_multiplier_leaves_store_untouched() {
        let mut store = MemStore::new();
        seed(&mut store, RewardCategory::HardSupply, &[("usdc", 3000)]);
        let before = state_digest(&store).expect("digest");

        let result = claim_reward(
            &mut store,
            &Params::default(),
            &table(),
            &owner(),
            &[RewardCategory::HardSupply],
            "huge",
            10,
        );
        assert!(matches!(result, Err(IncentiveError::InvalidMultiplier(_))));
        assert_eq!(state_digest(&store).expect("digest"), before);
    }

    #[test]
    fn test_nothing_to_claim() {
        let mut store = MemStore::new();
        let result = claim_reward(
            &mut store,
            &Params::default(),
            &table(),
            &owner(),
            &[RewardCategory::HardSupply],
            "small",
            1,
        );
        assert!(matches!(result, Err(IncentiveError::NothingToClaim { .. })));

        seed(&mut store, RewardCategory::HardSupply, &[("usdc", 0), ("bnb", 0)]);
        let result = claim_reward(
            &mut store,
            &Params::default(),
            &table(),
            &owner(),
            &[RewardCategory::HardSupply],
            "small",
            1,
        );
        assert!(matches!(result, Err(IncentiveError::NothingToClaim { .. })));
    }

    #[test]
    fn test_claim_after_end_height_rejected() {
        let mut store = MemStore::new();
        seed(&mut store, RewardCategory::HardSupply, &[("usdc", 10)]);
        let params = Params {
            claim_end_height: Some(50),
            ..Params::default()
        };

        let result = claim_reward(
            &mut store,
            &params,
            &table(),
            &owner(),
            &[RewardCategory::HardSupply],
            "small",
            51,
        );
        assert!(matches!(result, Err(IncentiveError::ClaimExpired { end: 50, height: 51 })));
        assert_eq!(load(&store, RewardCategory::HardSupply).unclaimed_for("usdc"), 10);
    }

    #[test]
    fn test_split_payout_large_amounts_floor_exactly() {
        let third = Decimal::from_str_exact("0.3333333333333333333333333333").expect("fraction");
        assert_eq!(
            split_payout(3_000_000_000_000_000_000, third).expect("split"),
            (999_999_999_999_999_999, 2_000_000_000_000_000_001)
        );
        assert_eq!(
            split_payout(u64::MAX, Decimal::new(5, 1)).expect("split"),
            (u64::MAX / 2, u64::MAX - u64::MAX / 2)
        );
    }
}
