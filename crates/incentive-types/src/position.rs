//! Read-only position snapshots handed to the lifecycle hooks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Address, Denom, RewardCategory};

/// Position variants maintained by external modules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    /// Collateralized debt position; size is the USDX principal.
    Cdp,
    /// Lending pool supply deposit.
    SupplyDeposit,
    /// Lending pool borrow.
    BorrowDeposit,
}

impl PositionKind {
    /// Reward category that accrues on this kind of position.
    pub fn category(self) -> RewardCategory {
        match self {
            PositionKind::Cdp => RewardCategory::UsdxMinting,
            PositionKind::SupplyDeposit => RewardCategory::HardSupply,
            PositionKind::BorrowDeposit => RewardCategory::HardBorrow,
        }
    }
}

/// The only view of a position the engine ever needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub kind: PositionKind,
    pub owner: Address,
    /// Size per denom. A CDP carries a single entry keyed by collateral type.
    pub amounts: BTreeMap<Denom, u64>,
}

impl PositionSnapshot {
    pub fn new(kind: PositionKind, owner: Address) -> Self {
        Self {
            kind,
            owner,
            amounts: BTreeMap::new(),
        }
    }

    /// Builder helper used by callers assembling a snapshot.
    pub fn with_amount(mut self, denom: impl Into<Denom>, size: u64) -> Self {
        self.amounts.insert(denom.into(), size);
        self
    }

    /// Size held in `denom`; zero when the position has none.
    pub fn size_of(&self, denom: &str) -> u64 {
        self.amounts.get(denom).copied().unwrap_or(0)
    }
}
