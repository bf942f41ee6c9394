//! Serial replay of a JSON-lines transition log.
//!
//! Each line is one [`Transition`]. A `begin_block` line opens a block and
//! closes the previous one; closing a block emits its state digest. Every
//! hook and claim runs as its own atomic transition. Rejected claims
//! produce a failed receipt and replay continues; fatal errors stop it.

use incentive_db::{state_digest, KvStore};
use incentive_keeper::accumulate::PositionTotals;
use incentive_keeper::handler::run_transition;
use incentive_keeper::{IncentiveError, Keeper, PositionHooks};
use incentive_types::{ClaimMsg, ClaimOutcome, Denom, Height, PositionSnapshot, RewardCategory};
use serde::{Deserialize, Serialize};

/// Total size of all positions in one `(category, denom)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTotal {
    pub category: RewardCategory,
    pub denom: Denom,
    pub total: u64,
}

/// Which lifecycle hook a position module fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    AfterPositionCreated,
    BeforePositionCreated,
    BeforePositionModified,
    AfterPositionModified,
}

/// One line of the transition log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    BeginBlock {
        height: Height,
        #[serde(default)]
        totals: Vec<PositionTotal>,
    },
    Hook {
        hook: HookKind,
        position: PositionSnapshot,
        denom: Denom,
    },
    Claim {
        msg: ClaimMsg,
    },
}

/// Result of one hook or claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub seq: u64,
    pub height: Height,
    pub kind: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ClaimOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State digest of a closed block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDigest {
    pub height: Height,
    pub app_hash: String,
}

/// A line printed by the replayer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Output {
    Receipt(Receipt),
    Block(BlockDigest),
}

pub struct Replayer<'k> {
    keeper: &'k Keeper,
    height: Option<Height>,
    resume_after: Option<Height>,
    skipping: bool,
    seq: u64,
}

impl<'k> Replayer<'k> {
    /// `resume_after` is the last block already in the store; blocks up to
    /// and including it are skipped.
    pub fn new(keeper: &'k Keeper, resume_after: Option<Height>) -> Self {
        Self {
            keeper,
            height: None,
            resume_after,
            skipping: false,
            seq: 0,
        }
    }

    pub fn height(&self) -> Option<Height> {
        self.height
    }

    /// Parse and apply one log line. Blank lines are ignored.
    pub fn apply_line<S: KvStore + ?Sized>(
        &mut self,
        store: &mut S,
        line: &str,
    ) -> anyhow::Result<Vec<Output>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }
        let transition: Transition = serde_json::from_str(line)
            .map_err(|e| anyhow::anyhow!("malformed transition: {e}"))?;
        self.apply(store, transition)
    }

    pub fn apply<S: KvStore + ?Sized>(
        &mut self,
        store: &mut S,
        transition: Transition,
    ) -> anyhow::Result<Vec<Output>> {
        match transition {
            Transition::BeginBlock { height, totals } => self.begin_block(store, height, &totals),
            _ if self.skipping => Ok(Vec::new()),
            Transition::Hook {
                hook,
                position,
                denom,
            } => {
                let height = self.current_height()?;
                self.apply_hook(store, hook, &position, &denom)?;
                Ok(vec![Output::Receipt(self.receipt(height, hook_name(hook), None, None))])
            }
            Transition::Claim { msg } => {
                let height = self.current_height()?;
                let receipt = match self.keeper.handle_claim_msg(store, &msg, height) {
                    Ok(outcome) => self.receipt(height, msg.msg_type(), Some(outcome), None),
                    Err(e) if !e.is_fatal() => {
                        self.receipt(height, msg.msg_type(), None, Some(e.to_string()))
                    }
                    Err(e) => return Err(e.into()),
                };
                Ok(vec![Output::Receipt(receipt)])
            }
        }
    }

    /// Close the open block, if any, and report its digest.
    pub fn finish<S: KvStore + ?Sized>(&mut self, store: &S) -> anyhow::Result<Option<Output>> {
        if self.skipping {
            return Ok(None);
        }
        match self.height.take() {
            Some(height) => Ok(Some(block_digest(store, height)?)),
            None => Ok(None),
        }
    }

    fn begin_block<S: KvStore + ?Sized>(
        &mut self,
        store: &mut S,
        height: Height,
        totals: &[PositionTotal],
    ) -> anyhow::Result<Vec<Output>> {
        if let Some(previous) = self.height {
            if height <= previous {
                anyhow::bail!("block height {height} does not follow {previous}");
            }
        }
        let mut out = Vec::new();
        if !self.skipping {
            if let Some(previous) = self.height {
                out.push(block_digest(store, previous)?);
            }
        }
        self.height = Some(height);
        self.skipping = self.resume_after.is_some_and(|last| height <= last);
        if self.skipping {
            tracing::debug!(height, "block already applied, skipping");
            return Ok(out);
        }

        let totals: PositionTotals = totals
            .iter()
            .map(|t| ((t.category, t.denom.clone()), t.total))
            .collect();
        run_transition(store, |cache| self.keeper.begin_block(cache, height, &totals))?;
        Ok(out)
    }

    fn apply_hook<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        hook: HookKind,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<(), IncentiveError> {
        let keeper = self.keeper;
        run_transition(store, |cache| match hook {
            HookKind::AfterPositionCreated => keeper.after_position_created(cache, position, denom),
            HookKind::BeforePositionCreated => {
                keeper.before_position_created(cache, position, denom)
            }
            HookKind::BeforePositionModified => {
                keeper.before_position_modified(cache, position, denom)
            }
            HookKind::AfterPositionModified => keeper.after_position_modified(cache, position, denom),
        })
    }

    fn current_height(&self) -> anyhow::Result<Height> {
        self.height
            .ok_or_else(|| anyhow::anyhow!("transition before the first begin_block"))
    }

    fn receipt(
        &mut self,
        height: Height,
        kind: &str,
        outcome: Option<ClaimOutcome>,
        error: Option<String>,
    ) -> Receipt {
        self.seq += 1;
        Receipt {
            seq: self.seq,
            height,
            kind: kind.to_string(),
            ok: error.is_none(),
            outcome,
            error,
        }
    }
}

fn hook_name(hook: HookKind) -> &'static str {
    match hook {
        HookKind::AfterPositionCreated => "after_position_created",
        HookKind::BeforePositionCreated => "before_position_created",
        HookKind::BeforePositionModified => "before_position_modified",
        HookKind::AfterPositionModified => "after_position_modified",
    }
}

fn block_digest<S: KvStore + ?Sized>(store: &S, height: Height) -> anyhow::Result<Output> {
    let digest = state_digest(store)?;
    Ok(Output::Block(BlockDigest {
        height,
        app_hash: hex::encode(digest),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use incentive_db::MemStore;
    use incentive_types::{Params, RewardPeriod};

    fn keeper() -> Keeper {
        let mut params = Params::default();
        params.hard_supply.periods.push(RewardPeriod {
            denom: "usdc".to_string(),
            rewards_per_block: 100,
        });
        Keeper::new(params).expect("keeper")
    }

    const OWNER: &str = "0101010101010101010101010101010101010101";

    fn log() -> Vec<String> {
        let position = |size: u64| {
            format!(
                r#"{{"kind":"supply_deposit","owner":"{OWNER}","amounts":{{"usdc":{size}}}}}"#
            )
        };
        let block = |h: u64, total: u64| {
            format!(
                r#"{{"kind":"begin_block","height":{h},"totals":[{{"category":"hard_supply","denom":"usdc","total":{total}}}]}}"#
            )
        };
        vec![
            block(1, 0),
            format!(
                r#"{{"kind":"hook","hook":"before_position_created","position":{},"denom":"usdc"}}"#,
                position(0)
            ),
            block(2, 10),
            block(3, 10),
            format!(
                r#"{{"kind":"hook","hook":"before_position_modified","position":{},"denom":"usdc"}}"#,
                position(10)
            ),
            format!(
                r#"{{"kind":"claim","msg":{{"type":"claim_hard_liquidity_provider_reward","value":{{"sender":"{OWNER}","multiplier_name":"large"}}}}}}"#
            ),
            format!(
                r#"{{"kind":"claim","msg":{{"type":"claim_hard_liquidity_provider_reward","value":{{"sender":"{OWNER}","multiplier_name":"huge"}}}}}}"#
            ),
        ]
    }

    fn run(store: &mut MemStore, keeper: &Keeper, resume_after: Option<Height>) -> Vec<Output> {
        let mut replayer = Replayer::new(keeper, resume_after);
        let mut out = Vec::new();
        for line in log() {
            out.extend(replayer.apply_line(store, &line).expect("apply"));
        }
        out.extend(replayer.finish(&*store).expect("finish"));
        out
    }

    #[test]
    fn test_replay_produces_receipts_and_digests() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let out = run(&mut store, &keeper, None);

        let receipts: Vec<_> = out
            .iter()
            .filter_map(|o| match o {
                Output::Receipt(r) => Some(r),
                Output::Block(_) => None,
            })
            .collect();
        let blocks: Vec<_> = out
            .iter()
            .filter_map(|o| match o {
                Output::Block(b) => Some(b.height),
                Output::Receipt(_) => None,
            })
            .collect();

        assert_eq!(blocks, vec![1, 2, 3]);
        assert_eq!(receipts.len(), 4);
        // Two blocks of 100 over 10 units, held by a 10-unit position.
        let claim = receipts[2];
        assert!(claim.ok);
        let outcome = claim.outcome.as_ref().expect("outcome");
        assert_eq!(outcome.total_paid(), 200);
        assert!(!receipts[3].ok);
        assert!(receipts[3].error.as_deref().is_some_and(|e| e.contains("huge")));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let keeper = keeper();
        let mut a = MemStore::new();
        let mut b = MemStore::new();
        assert_eq!(run(&mut a, &keeper, None), run(&mut b, &keeper, None));
        assert_eq!(a, b);
    }

    #[test]
    fn test_resume_skips_applied_blocks() {
        let keeper = keeper();
        let mut store = MemStore::new();
        run(&mut store, &keeper, None);
        let digest = state_digest(&store).expect("digest");

        let out = run(&mut store, &keeper, Some(3));
        assert!(out.is_empty());
        assert_eq!(state_digest(&store).expect("digest"), digest);
    }

    #[test]
    fn test_hook_before_block_rejected() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut replayer = Replayer::new(&keeper, None);
        let line = format!(
            r#"{{"kind":"claim","msg":{{"type":"claim_usdx_minting_reward","value":{{"sender":"{OWNER}","multiplier_name":"small"}}}}}}"#
        );
        assert!(replayer.apply_line(&mut store, &line).is_err());
    }

    #[test]
    fn test_non_increasing_height_rejected() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut replayer = Replayer::new(&keeper, None);
        replayer
            .apply_line(&mut store, r#"{"kind":"begin_block","height":5}"#)
            .expect("first");
        assert!(replayer
            .apply_line(&mut store, r#"{"kind":"begin_block","height":5}"#)
            .is_err());
    }

    #[test]
    fn test_fatal_hook_stops_replay() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut replayer = Replayer::new(&keeper, None);
        replayer
            .apply_line(&mut store, r#"{"kind":"begin_block","height":1}"#)
            .expect("block");
        let before = state_digest(&store).expect("digest");
        let line = format!(
            r#"{{"kind":"hook","hook":"before_position_modified","position":{{"kind":"supply_deposit","owner":"{OWNER}","amounts":{{}}}},"denom":"usdc"}}"#
        );
        assert!(replayer.apply_line(&mut store, &line).is_err());
        assert_eq!(state_digest(&store).expect("digest"), before);
    }
}
