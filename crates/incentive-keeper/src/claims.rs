//! Claim ledger: one [`ClaimRecord`] per `(category, owner)`.
//!
//! Records are drained on settlement, never deleted.

use incentive_db::{get_json, set_json, KvStore};
use incentive_types::{Address, ClaimRecord, RewardCategory};

use crate::keys;
use crate::{decode_value, Result};

pub fn get_claim<S: KvStore + ?Sized>(
    store: &S,
    category: RewardCategory,
    owner: &Address,
) -> Result<Option<ClaimRecord>> {
    Ok(get_json(store, &keys::claim_key(category, owner))?)
}

pub fn set_claim<S: KvStore + ?Sized>(store: &mut S, claim: &ClaimRecord) -> Result<()> {
    set_json(store, &keys::claim_key(claim.category, &claim.owner), claim)?;
    Ok(())
}

/// Every record of a category, ordered by owner bytes.
pub fn claims<S: KvStore + ?Sized>(store: &S, category: RewardCategory) -> Result<Vec<ClaimRecord>> {
    store
        .scan_prefix(&keys::claim_prefix(category))?
        .into_iter()
        .map(|(_, bytes)| decode_value(&bytes))
        .collect()
}

/// The owner's records across `categories`, skipping categories without one.
pub fn claims_for_owner<S: KvStore + ?Sized>(
    store: &S,
    owner: &Address,
    categories: &[RewardCategory],
) -> Result<Vec<ClaimRecord>> {
    let mut found = Vec::new();
    for category in categories {
        if let Some(claim) = get_claim(store, *category, owner)? {
            found.push(claim);
        }
    }
    Ok(found)
}
