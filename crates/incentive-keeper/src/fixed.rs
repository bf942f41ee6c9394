//! Exact fixed-point helpers.
//!
//! `Decimal` arithmetic rounds once a result needs more than 28 significant
//! digits, which can push a floor up by one unit. Everything that feeds a
//! floor or a stored index goes through integer mantissas instead:
//!
//! ```text
//! floor(amount * m / 10^s) = amount * (m / 10^s) + floor(amount * (m % 10^s) / 10^s)
//! ```
//!
//! with the divisor split at 10^18 so every intermediate fits in `u128`.

use incentive_types::INDEX_SCALE;
use rust_decimal::Decimal;

use crate::{IncentiveError, Result};

const ONE_E18: u128 = 1_000_000_000_000_000_000;

fn pow10(exp: u32) -> Result<u128> {
    10u128.checked_pow(exp).ok_or(IncentiveError::Overflow)
}

fn unsigned_mantissa(value: Decimal) -> Result<u128> {
    u128::try_from(value.mantissa()).map_err(|_| IncentiveError::Overflow)
}

/// `floor(amount * factor)`, exact for any non-negative `factor`.
///
/// # Errors
///
/// - [`IncentiveError::Overflow`] if `factor` is negative or the result does
///   not fit in `u64`
pub fn mul_floor(amount: u64, factor: Decimal) -> Result<u64> {
    if amount == 0 || factor.is_zero() {
        return Ok(0);
    }
    let mantissa = unsigned_mantissa(factor)?;
    let scale = factor.scale();
    let low = scale.min(18);
    let inner = pow10(low)?;
    let outer = pow10(scale - low)?;

    let amount = u128::from(amount);
    let whole = amount
        .checked_mul(mantissa / inner)
        .ok_or(IncentiveError::Overflow)?;
    // remainder < 10^18 < 2^60, so the product stays below 2^124
    let fraction = amount * (mantissa % inner) / inner;
    let floored = whole.checked_add(fraction).ok_or(IncentiveError::Overflow)? / outer;
    u64::try_from(floored).map_err(|_| IncentiveError::Overflow)
}

/// Mantissa of `value` at [`INDEX_SCALE`] places, truncating extra digits.
pub fn to_index_units(value: Decimal) -> Result<u128> {
    let mantissa = unsigned_mantissa(value)?;
    let scale = value.scale();
    if scale >= INDEX_SCALE {
        Ok(mantissa / pow10(scale - INDEX_SCALE)?)
    } else {
        mantissa
            .checked_mul(pow10(INDEX_SCALE - scale)?)
            .ok_or(IncentiveError::Overflow)
    }
}

/// Inverse of [`to_index_units`], normalized.
///
/// # Errors
///
/// - [`IncentiveError::Overflow`] if the value exceeds `Decimal`'s 96-bit
///   mantissa at [`INDEX_SCALE`] places
pub fn from_index_units(units: u128) -> Result<Decimal> {
    let units = i128::try_from(units).map_err(|_| IncentiveError::Overflow)?;
    Decimal::try_from_i128_with_scale(units, INDEX_SCALE)
        .map(|d| d.normalize())
        .map_err(|_| IncentiveError::Overflow)
}

/// Exact sum of two index values at [`INDEX_SCALE`] places.
pub fn add_index(a: Decimal, b: Decimal) -> Result<Decimal> {
    let sum = to_index_units(a)?
        .checked_add(to_index_units(b)?)
        .ok_or(IncentiveError::Overflow)?;
    from_index_units(sum)
}

/// `numerator / denominator` truncated to [`INDEX_SCALE`] places.
///
/// # Errors
///
/// - [`IncentiveError::Overflow`] on a zero denominator or a quotient too
///   large to store
pub fn div_to_index(numerator: u128, denominator: u64) -> Result<Decimal> {
    if denominator == 0 {
        return Err(IncentiveError::Overflow);
    }
    let denominator = u128::from(denominator);
    let whole = (numerator / denominator)
        .checked_mul(ONE_E18)
        .ok_or(IncentiveError::Overflow)?;
    // remainder < 2^64, times 10^18 stays below 2^124
    let fraction = (numerator % denominator) * ONE_E18 / denominator;
    from_index_units(whole.checked_add(fraction).ok_or(IncentiveError::Overflow)?)
}
