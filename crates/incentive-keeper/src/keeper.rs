//! The incentive keeper: validated params plus the operations that use them.

use incentive_db::KvStore;
use incentive_types::{
    Address, ClaimMsg, ClaimOutcome, ClaimRecord, Height, Params, RewardCategory, RewardIndex,
};

use crate::accumulate::{self, PositionTotals};
use crate::genesis::{self, GenesisState};
use crate::handler::{run_transition, validate_basic};
use crate::multiplier::MultiplierTable;
use crate::params::validate_params;
use crate::query::{self, QueryRewardsParams};
use crate::settlement;
use crate::Result;

/// Holds module parameters. All state lives in the store passed to each call.
#[derive(Clone, Debug)]
pub struct Keeper {
    params: Params,
    multipliers: MultiplierTable,
}

impl Keeper {
    /// # Errors
    ///
    /// - [`IncentiveError::InvalidParams`](crate::IncentiveError::InvalidParams)
    ///   if `params` fail validation
    pub fn new(params: Params) -> Result<Self> {
        validate_params(&params)?;
        let multipliers = MultiplierTable::from_specs(&params.multipliers)?;
        Ok(Self {
            params,
            multipliers,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn multipliers(&self) -> &MultiplierTable {
        &self.multipliers
    }

    /// Advance every configured index to `height`.
    pub fn begin_block<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        height: Height,
        totals: &PositionTotals,
    ) -> Result<()> {
        accumulate::begin_block(store, &self.params, height, totals)
    }

    /// Settle the owner's records in `categories`. Not atomic on its own;
    /// see [`Keeper::handle_claim_msg`].
    pub fn claim_reward<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        owner: &Address,
        categories: &[RewardCategory],
        multiplier_name: &str,
        height: Height,
    ) -> Result<ClaimOutcome> {
        settlement::claim_reward(
            store,
            &self.params,
            &self.multipliers,
            owner,
            categories,
            multiplier_name,
            height,
        )
    }

    /// Validate and settle a claim message as one atomic transition.
    pub fn handle_claim_msg<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        msg: &ClaimMsg,
        height: Height,
    ) -> Result<ClaimOutcome> {
        validate_basic(msg)?;
        let body = msg.body();
        run_transition(store, |cache| {
            self.claim_reward(
                cache,
                &body.sender,
                msg.categories(),
                &body.multiplier_name,
                height,
            )
        })
    }

    pub fn get_rewards<S: KvStore + ?Sized>(
        &self,
        store: &S,
        params: &QueryRewardsParams,
    ) -> Result<Vec<ClaimRecord>> {
        query::get_rewards(store, params)
    }

    pub fn get_parameters(&self) -> Params {
        self.params.clone()
    }

    pub fn get_reward_indexes<S: KvStore + ?Sized>(
        &self,
        store: &S,
        category: RewardCategory,
    ) -> Result<Vec<RewardIndex>> {
        query::get_reward_indexes(store, category)
    }

    /// Build a keeper from `genesis` and load its state into `store`.
    pub fn init_genesis<S: KvStore + ?Sized>(store: &mut S, genesis: &GenesisState) -> Result<Self> {
        let keeper = Self::new(genesis.params.clone())?;
        genesis::init_genesis(store, genesis)?;
        Ok(keeper)
    }

    pub fn export_genesis<S: KvStore + ?Sized>(&self, store: &S) -> Result<GenesisState> {
        genesis::export_genesis(store, &self.params)
    }
}
