//! Named vesting schedules applied at claim time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum length of a multiplier name.
pub const MAX_MULTIPLIER_NAME_LEN: usize = 32;

/// A named unlock schedule: `payout_fraction` of a claim is paid
/// immediately, the remainder unlocks after `lockup_blocks`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierSpec {
    pub name: String,
    pub lockup_blocks: u64,
    /// Fraction paid immediately, in (0, 1].
    pub payout_fraction: Decimal,
}

impl MultiplierSpec {
    pub fn new(name: impl Into<String>, lockup_blocks: u64, payout_fraction: Decimal) -> Self {
        Self {
            name: name.into(),
            lockup_blocks,
            payout_fraction,
        }
    }
}

/// Lower-case a multiplier name the way claim messages are matched.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Syntactic check on an already normalized name: `[a-z0-9_]`, 1..=32 chars.
pub fn is_well_formed_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_MULTIPLIER_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
