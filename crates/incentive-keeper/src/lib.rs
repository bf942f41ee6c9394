//! # incentive-keeper
//!
//! Reward accrual and claim settlement for CDP and lending positions.
//!
//! Each reward category keeps a per-denom global index: cumulative reward
//! per unit of position since genesis. Every owner has one claim record per
//! category holding unclaimed reward and the index values it last observed.
//! When a position changes, the owner's record is synchronized with the
//! position's pre-change size; on a claim message, unclaimed reward is split
//! into an immediate transfer and a vested remainder by a named multiplier.
//!
//! ## Modules
//!
//! - [`fixed`] — Exact fixed-point arithmetic
//! - [`multiplier`] — Multiplier table lookup
//! - [`index`] — Reward index store and accrual heights
//! - [`claims`] — Claim ledger
//! - [`sync`] — Claim initialization and synchronization
//! - [`accumulate`] — Per-block index advancement
//! - [`settlement`] — Claim settlement
//! - [`hooks`] — Position lifecycle hooks
//! - [`handler`] — Message validation and atomic transitions
//! - [`query`] — Read-only query surface
//! - [`genesis`] — Genesis import/export

pub mod accumulate;
pub mod claims;
pub mod fixed;
pub mod genesis;
pub mod handler;
pub mod hooks;
pub mod index;
pub mod keeper;
pub mod keys;
pub mod multiplier;
pub mod params;
pub mod query;
pub mod settlement;
pub mod sync;

pub use hooks::PositionHooks;
pub use keeper::Keeper;
pub use multiplier::MultiplierTable;

use incentive_db::DbError;
use incentive_types::{Address, Denom, Height, RewardCategory};
use rust_decimal::Decimal;

/// Error types for incentive operations.
///
/// Validation errors are reported to the caller with no state change.
/// Fatal errors indicate a broken invariant or coupling bug and abort the
/// whole state transition; see [`IncentiveError::is_fatal`].
#[derive(Debug, thiserror::Error)]
pub enum IncentiveError {
    /// Sender address is empty or malformed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Multiplier name is malformed or not in the multiplier table.
    #[error("invalid multiplier: {0}")]
    InvalidMultiplier(String),

    /// Owner has no positive unclaimed balance in the claimed categories.
    #[error("no claimable rewards for {owner}")]
    NothingToClaim {
        /// The claiming owner.
        owner: Address,
    },

    /// Claim submitted after the claim period ended.
    #[error("claim period ended at height {end}, current height {height}")]
    ClaimExpired {
        /// Last height at which claims are accepted.
        end: Height,
        /// Height of the rejected claim.
        height: Height,
    },

    /// Parameters failed validation.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Genesis state failed validation.
    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    /// Synchronize called for a denom the owner's claim never initialized.
    #[error("no {category} claim for {owner} tracking {denom}")]
    MissingClaim {
        /// Claim owner.
        owner: Address,
        /// Reward category.
        category: RewardCategory,
        /// Denom that was not initialized.
        denom: Denom,
    },

    /// A reward index would move backwards.
    #[error("{category} index for {denom} moved backward: {previous} -> {current}")]
    IndexRegression {
        /// Reward category.
        category: RewardCategory,
        /// Index denom.
        denom: Denom,
        /// Value already observed.
        previous: Decimal,
        /// Offending value.
        current: Decimal,
    },

    /// Accrual height for a denom would move backwards.
    #[error("{category} accrual height for {denom} moved backward: {previous} -> {current}")]
    HeightRegression {
        /// Reward category.
        category: RewardCategory,
        /// Index denom.
        denom: Denom,
        /// Recorded height.
        previous: Height,
        /// Offending height.
        current: Height,
    },

    /// Arithmetic overflow in accrual or settlement.
    #[error("arithmetic overflow")]
    Overflow,

    /// Underlying store failure.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl IncentiveError {
    /// Whether the error aborts the enclosing transition as a broken
    /// invariant rather than a user-correctable rejection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IncentiveError::MissingClaim { .. }
                | IncentiveError::IndexRegression { .. }
                | IncentiveError::HeightRegression { .. }
                | IncentiveError::Overflow
                | IncentiveError::Store(_)
        )
    }
}

/// Convenience result type for incentive operations.
pub type Result<T> = std::result::Result<T, IncentiveError>;

/// Decode a JSON value read during a prefix scan.
pub(crate) fn decode_value<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| IncentiveError::Store(DbError::from(e)))
}
