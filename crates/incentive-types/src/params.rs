//! Module parameters: multiplier table and emission rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Denom, Height, MultiplierSpec, RewardCategory};

/// Per-block reward emission for one position denom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPeriod {
    pub denom: Denom,
    /// Reward units emitted per block, shared across all positions of `denom`.
    pub rewards_per_block: u64,
}

/// Emission settings for one reward category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryParams {
    /// Token rewards of this category are paid in.
    pub reward_denom: Denom,
    #[serde(default)]
    pub periods: Vec<RewardPeriod>,
}

impl CategoryParams {
    pub fn new(reward_denom: impl Into<Denom>) -> Self {
        Self {
            reward_denom: reward_denom.into(),
            periods: Vec::new(),
        }
    }

    pub fn period(&self, denom: &str) -> Option<&RewardPeriod> {
        self.periods.iter().find(|p| p.denom == denom)
    }
}

/// Complete module configuration. Loaded once, immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Claims submitted after this height are rejected. `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_end_height: Option<Height>,
    #[serde(default = "default_multipliers")]
    pub multipliers: Vec<MultiplierSpec>,
    #[serde(default = "default_usdx_minting")]
    pub usdx_minting: CategoryParams,
    #[serde(default = "default_hard")]
    pub hard_supply: CategoryParams,
    #[serde(default = "default_hard")]
    pub hard_borrow: CategoryParams,
}

fn default_multipliers() -> Vec<MultiplierSpec> {
    vec![
        MultiplierSpec::new("small", 0, Decimal::new(2, 1)),
        MultiplierSpec::new("medium", 50, Decimal::new(5, 1)),
        MultiplierSpec::new("large", 100, Decimal::ONE),
    ]
}

fn default_usdx_minting() -> CategoryParams {
    CategoryParams::new("ukava")
}

fn default_hard() -> CategoryParams {
    CategoryParams::new("hard")
}

impl Default for Params {
    fn default() -> Self {
        Self {
            claim_end_height: None,
            multipliers: default_multipliers(),
            usdx_minting: default_usdx_minting(),
            hard_supply: default_hard(),
            hard_borrow: default_hard(),
        }
    }
}

impl Params {
    pub fn category(&self, category: RewardCategory) -> &CategoryParams {
        match category {
            RewardCategory::UsdxMinting => &self.usdx_minting,
            RewardCategory::HardSupply => &self.hard_supply,
            RewardCategory::HardBorrow => &self.hard_borrow,
        }
    }

    /// Every configured `(category, period)` pair, in category order.
    pub fn periods(&self) -> impl Iterator<Item = (RewardCategory, &RewardPeriod)> {
        RewardCategory::ALL
            .into_iter()
            .flat_map(move |c| self.category(c).periods.iter().map(move |p| (c, p)))
    }
}
