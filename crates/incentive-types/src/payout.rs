//! Records emitted by claim settlement.
//!
//! The engine never moves balances itself: it emits [`TransferInstruction`]s
//! for the bank ledger and [`PendingPayout`]s for the vesting ledger.

use serde::{Deserialize, Serialize};

use crate::{Address, Denom, Height, RewardCategory};

/// Immediate payment of the unlocked part of a claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    pub recipient: Address,
    pub category: RewardCategory,
    /// Position denom the reward was earned on.
    pub denom: Denom,
    /// Token the reward is paid in.
    pub reward_denom: Denom,
    pub amount: u64,
}

/// Deferred part of a claim, released at `unlock_height`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayout {
    pub owner: Address,
    pub category: RewardCategory,
    pub denom: Denom,
    pub reward_denom: Denom,
    pub amount: u64,
    pub unlock_height: Height,
}

/// Everything a successful claim produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub transfers: Vec<TransferInstruction>,
    pub pending: Vec<PendingPayout>,
}

impl ClaimOutcome {
    pub fn total_paid(&self) -> u64 {
        self.transfers.iter().map(|t| t.amount).sum()
    }

    pub fn total_deferred(&self) -> u64 {
        self.pending.iter().map(|p| p.amount).sum()
    }
}
