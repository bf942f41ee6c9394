//! Reward categories and reward indexes.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Denom, TypesError};

/// The three reward streams tracked by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    /// Rewards for minting USDX against a CDP.
    UsdxMinting,
    /// Rewards for supplying assets to the lending pool.
    HardSupply,
    /// Rewards for borrowing from the lending pool.
    HardBorrow,
}

impl RewardCategory {
    /// All categories, in storage order.
    pub const ALL: [RewardCategory; 3] = [
        RewardCategory::UsdxMinting,
        RewardCategory::HardSupply,
        RewardCategory::HardBorrow,
    ];

    /// Single-byte tag used in store keys.
    pub fn tag(self) -> u8 {
        match self {
            RewardCategory::UsdxMinting => 0x01,
            RewardCategory::HardSupply => 0x02,
            RewardCategory::HardBorrow => 0x03,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RewardCategory::UsdxMinting => "usdx_minting",
            RewardCategory::HardSupply => "hard_supply",
            RewardCategory::HardBorrow => "hard_borrow",
        }
    }
}

impl fmt::Display for RewardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim type filter accepted by the rewards query.
///
/// `Hard` covers both supply and borrow claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimTypeFilter {
    UsdxMinting,
    Hard,
}

impl ClaimTypeFilter {
    /// Categories selected by this filter.
    pub fn categories(self) -> &'static [RewardCategory] {
        match self {
            ClaimTypeFilter::UsdxMinting => &[RewardCategory::UsdxMinting],
            ClaimTypeFilter::Hard => &[RewardCategory::HardSupply, RewardCategory::HardBorrow],
        }
    }
}

impl FromStr for ClaimTypeFilter {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usdx_minting" => Ok(ClaimTypeFilter::UsdxMinting),
            "hard" => Ok(ClaimTypeFilter::Hard),
            other => Err(TypesError::UnknownRewardType(other.to_string())),
        }
    }
}

/// Cumulative reward-per-unit-position for a denom since genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardIndex {
    pub denom: Denom,
    pub value: Decimal,
}

impl RewardIndex {
    pub fn new(denom: impl Into<Denom>, value: Decimal) -> Self {
        Self {
            denom: denom.into(),
            value,
        }
    }
}
