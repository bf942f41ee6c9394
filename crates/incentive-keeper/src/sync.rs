//! Claim initialization and synchronization.
//!
//! ## Formula
//!
//! ```text
//! accrued = floor(size * (global_index - claim_snapshot))
//! ```
//!
//! `size` is always the position size *before* the mutation that triggered
//! the call: the accrual pays for holding that size up to now.

use incentive_db::KvStore;
use incentive_types::{Address, ClaimRecord, RewardCategory};
use rust_decimal::Decimal;

use crate::{claims, fixed, index};
use crate::{IncentiveError, Result};

/// Reward earned by holding `size` units while the index grew by `index_delta`.
///
/// # Errors
///
/// - [`IncentiveError::Overflow`] if the product does not fit in `u64`
pub fn accrue(size: u64, index_delta: Decimal) -> Result<u64> {
    fixed::mul_floor(size, index_delta)
}

/// Start tracking `denom` for `owner`, creating the claim record if needed.
///
/// The snapshot is set to the current global index, so nothing accrues for
/// time before the position existed. Existing balances are preserved.
pub fn initialize_claim<S: KvStore + ?Sized>(
    store: &mut S,
    category: RewardCategory,
    owner: &Address,
    denom: &str,
) -> Result<ClaimRecord> {
    let global = index::get_index(store, category, denom)?;
    let mut claim = claims::get_claim(store, category, owner)?
        .unwrap_or_else(|| ClaimRecord::new(owner.clone(), category));

    claim.reward_indexes.insert(denom.to_string(), global);
    claim.unclaimed.entry(denom.to_string()).or_insert(0);
    claims::set_claim(store, &claim)?;

    tracing::debug!(
        owner = %owner,
        category = %category,
        denom,
        index = %global,
        "claim initialized"
    );

    Ok(claim)
}

/// Fold reward accrued since the last snapshot into the owner's balance and
/// advance the snapshot to the global index. Returns the accrued amount.
///
/// Calling this again without the index moving is a no-op.
///
/// # Errors
///
/// - [`IncentiveError::MissingClaim`] if the owner has no record tracking
///   `denom` (the caller skipped initialization)
/// - [`IncentiveError::IndexRegression`] if the snapshot is ahead of the
///   global index
/// - [`IncentiveError::Overflow`] if the balance overflows
pub fn synchronize_claim<S: KvStore + ?Sized>(
    store: &mut S,
    category: RewardCategory,
    owner: &Address,
    denom: &str,
    pre_mutation_size: u64,
) -> Result<u64> {
    let missing = || IncentiveError::MissingClaim {
        owner: owner.clone(),
        category,
        denom: denom.to_string(),
    };
    let mut claim = claims::get_claim(store, category, owner)?.ok_or_else(missing)?;
    let snapshot = *claim.reward_indexes.get(denom).ok_or_else(missing)?;
    let global = index::get_index(store, category, denom)?;

    if global < snapshot {
        return Err(IncentiveError::IndexRegression {
            category,
            denom: denom.to_string(),
            previous: snapshot,
            current: global,
        });
    }
    if global == snapshot {
        return Ok(0);
    }

    let accrued = accrue(pre_mutation_size, global - snapshot)?;
    let balance = claim.unclaimed.entry(denom.to_string()).or_insert(0);
    *balance = balance.checked_add(accrued).ok_or(IncentiveError::Overflow)?;
    claim.reward_indexes.insert(denom.to_string(), global);
    claims::set_claim(store, &claim)?;

    tracing::trace!(
        owner = %owner,
        category = %category,
        denom,
        size = pre_mutation_size,
        accrued,
        "claim synchronized"
    );

    Ok(accrued)
}
