//! Read-only query surface.

use incentive_db::KvStore;
use incentive_types::{Address, ClaimRecord, ClaimTypeFilter, RewardCategory, RewardIndex};
use serde::{Deserialize, Serialize};

use crate::{claims, index, Result};

/// Page size used when a query passes `limit = 0`.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Arguments of the rewards query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRewardsParams {
    /// Restrict to one owner's records.
    #[serde(default)]
    pub owner: Option<Address>,
    /// Restrict to one claim type; `None` returns every category.
    #[serde(default)]
    pub claim_type: Option<ClaimTypeFilter>,
    /// 1-based page number; 0 reads as 1.
    #[serde(default)]
    pub page: usize,
    /// Page size; 0 reads as [`DEFAULT_QUERY_LIMIT`].
    #[serde(default)]
    pub limit: usize,
}

impl QueryRewardsParams {
    pub fn new(
        owner: Option<Address>,
        claim_type: Option<ClaimTypeFilter>,
        page: usize,
        limit: usize,
    ) -> Self {
        Self {
            owner,
            claim_type,
            page,
            limit,
        }
    }

    fn categories(&self) -> &'static [RewardCategory] {
        match self.claim_type {
            Some(filter) => filter.categories(),
            None => &RewardCategory::ALL,
        }
    }
}

/// Claim records matching `params`, in category then owner order.
pub fn get_rewards<S: KvStore + ?Sized>(
    store: &S,
    params: &QueryRewardsParams,
) -> Result<Vec<ClaimRecord>> {
    let categories = params.categories();
    let records = match &params.owner {
        Some(owner) => claims::claims_for_owner(store, owner, categories)?,
        None => {
            let mut all = Vec::new();
            for category in categories {
                all.extend(claims::claims(store, *category)?);
            }
            all
        }
    };
    Ok(paginate(records, params.page, params.limit))
}

/// Slice one page out of `items`. Out-of-range pages are empty.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Vec<T> {
    let limit = if limit == 0 { DEFAULT_QUERY_LIMIT } else { limit };
    let page = page.max(1);
    let start = (page - 1).saturating_mul(limit);
    items.into_iter().skip(start).take(limit).collect()
}

/// All global indexes of a category.
pub fn get_reward_indexes<S: KvStore + ?Sized>(
    store: &S,
    category: RewardCategory,
) -> Result<Vec<RewardIndex>> {
    index::indexes(store, category)
}
