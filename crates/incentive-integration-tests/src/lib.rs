//! Integration test crate for the incentive engine.
//!
//! The library holds [`PositionLedger`], a stand-in for the CDP and lending
//! modules: it owns position sizes, fires the lifecycle hooks in the order
//! those modules do, and feeds per-block totals into accumulation. The
//! tests under `tests/` drive it against both store backends.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p incentive-integration-tests
//! ```

use std::collections::BTreeMap;

use incentive_db::KvStore;
use incentive_keeper::accumulate::PositionTotals;
use incentive_keeper::handler::run_transition;
use incentive_keeper::{Keeper, PositionHooks, Result};
use incentive_types::{Address, ClaimMsg, ClaimOutcome, Height, PositionKind, PositionSnapshot};

/// Position sizes keyed by `(kind, owner)`, plus the current block height.
pub struct PositionLedger {
    pub keeper: Keeper,
    pub height: Height,
    positions: BTreeMap<(PositionKind, Address), PositionSnapshot>,
}

impl PositionLedger {
    pub fn new(keeper: Keeper) -> Self {
        Self {
            keeper,
            height: 0,
            positions: BTreeMap::new(),
        }
    }

    pub fn position(&self, kind: PositionKind, owner: &Address) -> Option<&PositionSnapshot> {
        self.positions.get(&(kind, owner.clone()))
    }

    /// Sum of all position sizes per `(category, denom)`.
    pub fn totals(&self) -> PositionTotals {
        let mut totals = PositionTotals::new();
        for position in self.positions.values() {
            for (denom, size) in &position.amounts {
                *totals
                    .entry((position.kind.category(), denom.clone()))
                    .or_insert(0) += size;
            }
        }
        totals
    }

    /// Open the next block and accumulate rewards for it.
    pub fn next_block<S: KvStore + ?Sized>(&mut self, store: &mut S) -> Result<Height> {
        self.advance(store, 1)
    }

    /// Skip `blocks` heights at once.
    pub fn advance<S: KvStore + ?Sized>(&mut self, store: &mut S, blocks: u64) -> Result<Height> {
        self.height += blocks;
        let totals = self.totals();
        let height = self.height;
        let keeper = &self.keeper;
        run_transition(store, |cache| keeper.begin_block(cache, height, &totals))?;
        Ok(height)
    }

    /// Grow a position, creating it (and its claim) when new.
    pub fn deposit<S: KvStore + ?Sized>(
        &mut self,
        store: &mut S,
        kind: PositionKind,
        owner: &Address,
        denom: &str,
        amount: u64,
    ) -> Result<()> {
        let key = (kind, owner.clone());
        let keeper = &self.keeper;
        match self.positions.get_mut(&key) {
            Some(position) if position.amounts.contains_key(denom) => {
                let before = position.clone();
                run_transition(store, |cache| {
                    keeper.before_position_modified(cache, &before, denom)
                })?;
                if let Some(size) = position.amounts.get_mut(denom) {
                    *size += amount;
                }
                run_transition(store, |cache| {
                    keeper.after_position_modified(cache, &*position, denom)
                })?;
            }
            Some(position) => {
                // A new denom on an existing deposit starts tracking
                // through the creation hook.
                run_transition(store, |cache| {
                    keeper.before_position_created(cache, &*position, denom)
                })?;
                position.amounts.insert(denom.to_string(), amount);
            }
            None => {
                let position =
                    PositionSnapshot::new(kind, owner.clone()).with_amount(denom, amount);
                run_transition(store, |cache| match kind {
                    PositionKind::Cdp => keeper.after_position_created(cache, &position, denom),
                    PositionKind::SupplyDeposit | PositionKind::BorrowDeposit => {
                        keeper.before_position_created(cache, &position, denom)
                    }
                })?;
                self.positions.insert(key, position);
            }
        }
        Ok(())
    }

    /// Shrink a position, never below zero.
    pub fn withdraw<S: KvStore + ?Sized>(
        &mut self,
        store: &mut S,
        kind: PositionKind,
        owner: &Address,
        denom: &str,
        amount: u64,
    ) -> Result<()> {
        let keeper = &self.keeper;
        let Some(position) = self.positions.get_mut(&(kind, owner.clone())) else {
            return Ok(());
        };
        if !position.amounts.contains_key(denom) {
            return Ok(());
        }
        let before = position.clone();
        run_transition(store, |cache| {
            keeper.before_position_modified(cache, &before, denom)
        })?;
        if let Some(size) = position.amounts.get_mut(denom) {
            *size = size.saturating_sub(amount);
        }
        Ok(())
    }

    /// Fold all accrued reward of `owner` into its claim records.
    pub fn sync_owner<S: KvStore + ?Sized>(&self, store: &mut S, owner: &Address) -> Result<()> {
        for ((_, position_owner), position) in &self.positions {
            if position_owner != owner {
                continue;
            }
            for denom in position.amounts.keys() {
                run_transition(store, |cache| {
                    self.keeper.before_position_modified(cache, position, denom)
                })?;
            }
        }
        Ok(())
    }

    /// Submit a claim at the current height.
    pub fn claim<S: KvStore + ?Sized>(&self, store: &mut S, msg: &ClaimMsg) -> Result<ClaimOutcome> {
        self.keeper.handle_claim_msg(store, msg, self.height)
    }
}

/// Deterministic 20-byte address.
pub fn address(seed: u8) -> Address {
    Address::new(vec![seed; 20])
}
