//! Store key layout.
//!
//! ```text
//! 0x01 | category | denom  -> RewardIndex
//! 0x02 | category | owner  -> ClaimRecord
//! 0x03 | category | denom  -> AccrualHeight
//! ```
//!
//! Every key starts with a two-byte `(prefix, category)` pair so each
//! category can be iterated on its own.

use incentive_types::{Address, RewardCategory};

pub const INDEX_PREFIX: u8 = 0x01;
pub const CLAIM_PREFIX: u8 = 0x02;
pub const ACCRUAL_PREFIX: u8 = 0x03;

fn key(prefix: u8, category: RewardCategory, suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + suffix.len());
    key.push(prefix);
    key.push(category.tag());
    key.extend_from_slice(suffix);
    key
}

pub fn index_key(category: RewardCategory, denom: &str) -> Vec<u8> {
    key(INDEX_PREFIX, category, denom.as_bytes())
}

pub fn index_prefix(category: RewardCategory) -> [u8; 2] {
    [INDEX_PREFIX, category.tag()]
}

pub fn claim_key(category: RewardCategory, owner: &Address) -> Vec<u8> {
    key(CLAIM_PREFIX, category, owner.as_bytes())
}

pub fn claim_prefix(category: RewardCategory) -> [u8; 2] {
    [CLAIM_PREFIX, category.tag()]
}

pub fn accrual_key(category: RewardCategory, denom: &str) -> Vec<u8> {
    key(ACCRUAL_PREFIX, category, denom.as_bytes())
}

pub fn accrual_prefix(category: RewardCategory) -> [u8; 2] {
    [ACCRUAL_PREFIX, category.tag()]
}
