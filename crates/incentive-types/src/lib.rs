//! # incentive-types
//!
//! Shared domain types for the incentive workspace: reward categories and
//! indexes, claim records, multipliers, payout instructions, position
//! snapshots, claim messages and module parameters.
//!
//! All amounts are integer base units (`u64`). All per-unit reward values
//! are [`rust_decimal::Decimal`] fixed-point numbers; no floating point is
//! used anywhere in the workspace.

pub mod address;
pub mod claim;
pub mod msg;
pub mod multiplier;
pub mod params;
pub mod payout;
pub mod position;
pub mod reward;

pub use address::Address;
pub use claim::ClaimRecord;
pub use msg::{ClaimMsg, MsgClaimReward};
pub use multiplier::MultiplierSpec;
pub use params::{CategoryParams, Params, RewardPeriod};
pub use payout::{ClaimOutcome, PendingPayout, TransferInstruction};
pub use position::{PositionKind, PositionSnapshot};
pub use reward::{ClaimTypeFilter, RewardCategory, RewardIndex};

/// Common type aliases.
pub type Denom = String;
pub type Height = u64;

/// Number of decimal places kept on every reward accumulator.
pub const INDEX_SCALE: u32 = 18;

/// Errors raised while parsing or constructing shared types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// Address is not valid hex.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Unknown reward category or claim type name.
    #[error("unknown reward type: {0}")]
    UnknownRewardType(String),
}
