//! Per-block reward index advancement.
//!
//! ## Formula
//!
//! ```text
//! delta_per_unit = rewards_per_block * (height - last_accrual_height) / total_size
//! ```
//!
//! Runs once per block for every configured reward period, before any hook
//! or claim of that block is processed.

use std::collections::BTreeMap;

use incentive_db::KvStore;
use incentive_types::{Denom, Height, Params, RewardCategory};
use rust_decimal::Decimal;

use crate::{fixed, index};
use crate::{IncentiveError, Result};

/// Total position size per `(category, denom)` at the start of a block.
pub type PositionTotals = BTreeMap<(RewardCategory, Denom), u64>;

/// Advance the index for one `(category, denom)` up to `height`.
///
/// The first call only records the height. Blocks during which nothing was
/// deposited emit nothing: their rewards are not carried forward.
///
/// # Errors
///
/// - [`IncentiveError::HeightRegression`] if `height` is below the recorded
///   accrual height
/// - [`IncentiveError::Overflow`] on arithmetic overflow
pub fn accumulate_rewards<S: KvStore + ?Sized>(
    store: &mut S,
    params: &Params,
    category: RewardCategory,
    denom: &str,
    height: Height,
    total_size: u64,
) -> Result<Decimal> {
    let Some(previous) = index::get_accrual_height(store, category, denom)? else {
        index::set_accrual_height(store, category, denom, height)?;
        return Ok(Decimal::ZERO);
    };
    if height < previous {
        return Err(IncentiveError::HeightRegression {
            category,
            denom: denom.to_string(),
            previous,
            current: height,
        });
    }

    let elapsed = height - previous;
    let rate = params
        .category(category)
        .period(denom)
        .map(|p| p.rewards_per_block)
        .unwrap_or(0);

    let mut delta = Decimal::ZERO;
    if elapsed > 0 && total_size > 0 && rate > 0 {
        let emitted = u128::from(rate) * u128::from(elapsed);
        delta = fixed::div_to_index(emitted, total_size)?;
        index::advance_index(store, category, denom, delta)?;
    }
    index::set_accrual_height(store, category, denom, height)?;

    Ok(delta)
}

/// Accumulate every configured reward period at `height`.
///
/// Denoms missing from `totals` are treated as having no positions.
pub fn begin_block<S: KvStore + ?Sized>(
    store: &mut S,
    params: &Params,
    height: Height,
    totals: &PositionTotals,
) -> Result<()> {
    for (category, period) in params.periods() {
        let total = totals
            .get(&(category, period.denom.clone()))
            .copied()
            .unwrap_or(0);
        accumulate_rewards(store, params, category, &period.denom, height, total)?;
    }
    tracing::debug!(height, periods = params.periods().count(), "rewards accumulated");
    Ok(())
}
