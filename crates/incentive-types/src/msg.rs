//! Claim request messages.

use serde::{Deserialize, Serialize};

use crate::{Address, RewardCategory};

/// Router key shared by all incentive messages.
pub const ROUTER_KEY: &str = "incentive";

/// Body shared by both claim messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgClaimReward {
    pub sender: Address,
    pub multiplier_name: String,
}

impl MsgClaimReward {
    pub fn new(sender: Address, multiplier_name: impl Into<String>) -> Self {
        Self {
            sender,
            multiplier_name: multiplier_name.into(),
        }
    }
}

/// A signed claim request, already authenticated by the envelope layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ClaimMsg {
    /// Claim USDX minting rewards.
    ClaimUsdxMintingReward(MsgClaimReward),
    /// Claim Hard supply and borrow rewards together.
    ClaimHardLiquidityProviderReward(MsgClaimReward),
}

impl ClaimMsg {
    pub fn route(&self) -> &'static str {
        ROUTER_KEY
    }

    pub fn msg_type(&self) -> &'static str {
        match self {
            ClaimMsg::ClaimUsdxMintingReward(_) => "claim_usdx_minting_reward",
            ClaimMsg::ClaimHardLiquidityProviderReward(_) => "claim_hard_liquidity_provider_reward",
        }
    }

    pub fn body(&self) -> &MsgClaimReward {
        match self {
            ClaimMsg::ClaimUsdxMintingReward(m) | ClaimMsg::ClaimHardLiquidityProviderReward(m) => m,
        }
    }

    /// Categories whose claim records this message settles.
    pub fn categories(&self) -> &'static [RewardCategory] {
        match self {
            ClaimMsg::ClaimUsdxMintingReward(_) => &[RewardCategory::UsdxMinting],
            ClaimMsg::ClaimHardLiquidityProviderReward(_) => {
                &[RewardCategory::HardSupply, RewardCategory::HardBorrow]
            }
        }
    }

    /// Addresses that must have signed the message.
    pub fn signers(&self) -> Vec<Address> {
        vec![self.body().sender.clone()]
    }
}
