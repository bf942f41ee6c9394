//! Genesis import and export.

use std::collections::{BTreeMap, BTreeSet};

use incentive_db::KvStore;
use incentive_types::{Address, ClaimRecord, Denom, Params, RewardCategory, INDEX_SCALE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::index::{self, AccrualHeight};
use crate::params::validate_params;
use crate::{claims, IncentiveError, Result};

/// A global index entry in genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisRewardIndex {
    pub category: RewardCategory,
    pub denom: Denom,
    pub value: Decimal,
}

/// Full module state at a given height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub reward_indexes: Vec<GenesisRewardIndex>,
    #[serde(default)]
    pub accrual_heights: Vec<AccrualHeight>,
    #[serde(default)]
    pub claims: Vec<ClaimRecord>,
}

/// Reject values the index store cannot hold exactly.
fn check_index_value(what: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(IncentiveError::InvalidGenesis(format!("negative {what}")));
    }
    if value.normalize().scale() > INDEX_SCALE {
        return Err(IncentiveError::InvalidGenesis(format!(
            "{what} {value} has more than {INDEX_SCALE} decimal places"
        )));
    }
    Ok(())
}

impl GenesisState {
    /// Genesis with the given params and no state.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            reward_indexes: Vec::new(),
            accrual_heights: Vec::new(),
            claims: Vec::new(),
        }
    }

    /// Check params and internal consistency.
    ///
    /// Claim snapshots may not exceed the matching global index, since the
    /// first synchronization would then see the index move backwards.
    pub fn validate(&self) -> Result<()> {
        validate_params(&self.params)
            .map_err(|e| IncentiveError::InvalidGenesis(e.to_string()))?;

        let mut globals: BTreeMap<(RewardCategory, &str), Decimal> = BTreeMap::new();
        for entry in &self.reward_indexes {
            check_index_value(
                &format!("{} index for {}", entry.category, entry.denom),
                entry.value,
            )?;
            if globals
                .insert((entry.category, entry.denom.as_str()), entry.value)
                .is_some()
            {
                return Err(IncentiveError::InvalidGenesis(format!(
                    "duplicate {} index for {}",
                    entry.category, entry.denom
                )));
            }
        }

        let mut heights = BTreeSet::new();
        for entry in &self.accrual_heights {
            if !heights.insert((entry.category, entry.denom.as_str())) {
                return Err(IncentiveError::InvalidGenesis(format!(
                    "duplicate {} accrual height for {}",
                    entry.category, entry.denom
                )));
            }
        }

        let mut owners: BTreeSet<(RewardCategory, &Address)> = BTreeSet::new();
        for claim in &self.claims {
            if claim.owner.is_empty() {
                return Err(IncentiveError::InvalidGenesis(
                    "claim with empty owner".to_string(),
                ));
            }
            if !owners.insert((claim.category, &claim.owner)) {
                return Err(IncentiveError::InvalidGenesis(format!(
                    "duplicate {} claim for {}",
                    claim.category, claim.owner
                )));
            }
            for (denom, snapshot) in &claim.reward_indexes {
                check_index_value(
                    &format!("{} {denom} snapshot of {}", claim.category, claim.owner),
                    *snapshot,
                )?;
                let global = globals
                    .get(&(claim.category, denom.as_str()))
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                if *snapshot > global {
                    return Err(IncentiveError::InvalidGenesis(format!(
                        "{} claim for {} has {denom} snapshot {snapshot} above global {global}",
                        claim.category, claim.owner
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for GenesisState {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

/// Write a validated genesis into an empty store.
pub fn init_genesis<S: KvStore + ?Sized>(store: &mut S, genesis: &GenesisState) -> Result<()> {
    genesis.validate()?;

    for entry in &genesis.reward_indexes {
        index::set_index(store, entry.category, &entry.denom, entry.value)?;
    }
    for entry in &genesis.accrual_heights {
        index::set_accrual_height(store, entry.category, &entry.denom, entry.height)?;
    }
    for claim in &genesis.claims {
        let mut claim = claim.clone();
        for snapshot in claim.reward_indexes.values_mut() {
            *snapshot = index::canonical(*snapshot);
        }
        claims::set_claim(store, &claim)?;
    }

    tracing::info!(
        indexes = genesis.reward_indexes.len(),
        accrual_heights = genesis.accrual_heights.len(),
        claims = genesis.claims.len(),
        "genesis initialized"
    );
    Ok(())
}

/// Snapshot the store as a genesis state.
pub fn export_genesis<S: KvStore + ?Sized>(store: &S, params: &Params) -> Result<GenesisState> {
    let mut genesis = GenesisState::new(params.clone());
    for category in RewardCategory::ALL {
        for idx in index::indexes(store, category)? {
            genesis.reward_indexes.push(GenesisRewardIndex {
                category,
                denom: idx.denom,
                value: idx.value,
            });
        }
        genesis
            .accrual_heights
            .extend(index::accrual_heights(store, category)?);
        genesis.claims.extend(claims::claims(store, category)?);
    }
    Ok(genesis)
}
