//! Reward index store.
//!
//! One accumulator per `(category, denom)`: cumulative reward per unit of
//! position since genesis. Accumulators only ever grow, and are kept at
//! [`INDEX_SCALE`] decimal places (truncated toward zero) so every node
//! stores byte-identical values.
//!
//! The store also records, per `(category, denom)`, the height at which
//! rewards were last accumulated.

use incentive_db::{get_json, set_json, KvStore};
use incentive_types::{Denom, Height, RewardCategory, RewardIndex, INDEX_SCALE};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{fixed, keys};
use crate::{decode_value, IncentiveError, Result};

/// Last height at which an index was accumulated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualHeight {
    pub category: RewardCategory,
    pub denom: Denom,
    pub height: Height,
}

/// Truncate to the canonical accumulator precision.
pub fn canonical(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(INDEX_SCALE, RoundingStrategy::ToZero)
        .normalize()
}

/// Stored index for `denom`, if one was ever written.
pub fn find_index<S: KvStore + ?Sized>(
    store: &S,
    category: RewardCategory,
    denom: &str,
) -> Result<Option<Decimal>> {
    let index: Option<RewardIndex> = get_json(store, &keys::index_key(category, denom))?;
    Ok(index.map(|i| i.value))
}

/// Current global index for `denom`; zero if it never accumulated.
pub fn get_index<S: KvStore + ?Sized>(
    store: &S,
    category: RewardCategory,
    denom: &str,
) -> Result<Decimal> {
    Ok(find_index(store, category, denom)?.unwrap_or(Decimal::ZERO))
}

/// Overwrite an index, refusing to move it backwards.
///
/// # Errors
///
/// - [`IncentiveError::IndexRegression`] if `value` is below the stored index
///   or negative
pub fn set_index<S: KvStore + ?Sized>(
    store: &mut S,
    category: RewardCategory,
    denom: &str,
    value: Decimal,
) -> Result<()> {
    let value = canonical(value);
    let previous = get_index(store, category, denom)?;
    if value < previous || value.is_sign_negative() {
        return Err(IncentiveError::IndexRegression {
            category,
            denom: denom.to_string(),
            previous,
            current: value,
        });
    }
    set_json(
        store,
        &keys::index_key(category, denom),
        &RewardIndex::new(denom, value),
    )?;
    Ok(())
}

/// Add `delta_per_unit` to the index and return the new value.
///
/// # Errors
///
/// - [`IncentiveError::IndexRegression`] if `delta_per_unit` is negative
/// - [`IncentiveError::Overflow`] if the accumulator overflows
pub fn advance_index<S: KvStore + ?Sized>(
    store: &mut S,
    category: RewardCategory,
    denom: &str,
    delta_per_unit: Decimal,
) -> Result<Decimal> {
    let previous = get_index(store, category, denom)?;
    if delta_per_unit.is_sign_negative() && !delta_per_unit.is_zero() {
        return Err(IncentiveError::IndexRegression {
            category,
            denom: denom.to_string(),
            previous,
            current: previous + delta_per_unit,
        });
    }
    let next = fixed::add_index(previous, delta_per_unit)?;
    set_index(store, category, denom, next)?;
    let stored = canonical(next);

    tracing::trace!(
        category = %category,
        denom,
        delta = %delta_per_unit,
        index = %stored,
        "reward index advanced"
    );

    Ok(stored)
}

/// All indexes of a category, ordered by denom bytes.
pub fn indexes<S: KvStore + ?Sized>(store: &S, category: RewardCategory) -> Result<Vec<RewardIndex>> {
    store
        .scan_prefix(&keys::index_prefix(category))?
        .into_iter()
        .map(|(_, bytes)| decode_value(&bytes))
        .collect()
}

pub fn get_accrual_height<S: KvStore + ?Sized>(
    store: &S,
    category: RewardCategory,
    denom: &str,
) -> Result<Option<Height>> {
    let record: Option<AccrualHeight> = get_json(store, &keys::accrual_key(category, denom))?;
    Ok(record.map(|r| r.height))
}

pub fn set_accrual_height<S: KvStore + ?Sized>(
    store: &mut S,
    category: RewardCategory,
    denom: &str,
    height: Height,
) -> Result<()> {
    let record = AccrualHeight {
        category,
        denom: denom.to_string(),
        height,
    };
    set_json(store, &keys::accrual_key(category, denom), &record)?;
    Ok(())
}

pub fn accrual_heights<S: KvStore + ?Sized>(
    store: &S,
    category: RewardCategory,
) -> Result<Vec<AccrualHeight>> {
    store
        .scan_prefix(&keys::accrual_prefix(category))?
        .into_iter()
        .map(|(_, bytes)| decode_value(&bytes))
        .collect()
}
