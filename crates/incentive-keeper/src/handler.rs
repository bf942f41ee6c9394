//! Message validation and atomic state transitions.

use incentive_db::{CacheStore, KvStore};
use incentive_types::multiplier::{is_well_formed_name, normalize_name};
use incentive_types::ClaimMsg;

use crate::{IncentiveError, Result};

/// Stateless checks run before a claim touches the store.
///
/// # Errors
///
/// - [`IncentiveError::InvalidAddress`] if the sender is empty
/// - [`IncentiveError::InvalidMultiplier`] if the lower-cased multiplier
///   name is malformed
pub fn validate_basic(msg: &ClaimMsg) -> Result<()> {
    let body = msg.body();
    if body.sender.is_empty() {
        return Err(IncentiveError::InvalidAddress(
            "sender address cannot be empty".to_string(),
        ));
    }
    if !is_well_formed_name(&normalize_name(&body.multiplier_name)) {
        return Err(IncentiveError::InvalidMultiplier(body.multiplier_name.clone()));
    }
    Ok(())
}

/// Run `f` against a write buffer over `store`.
///
/// Writes reach `store` only if `f` succeeds; on any error they are dropped
/// and `store` is left exactly as it was.
pub fn run_transition<S, T, F>(store: &mut S, f: F) -> Result<T>
where
    S: KvStore + ?Sized,
    F: FnOnce(&mut CacheStore<'_, S>) -> Result<T>,
{
    let mut cache = CacheStore::new(store);
    match f(&mut cache) {
        Ok(value) => {
            cache.commit()?;
            Ok(value)
        }
        Err(e) => {
            if e.is_fatal() {
                tracing::error!(error = %e, "transition aborted");
            } else {
                tracing::warn!(error = %e, "transition rejected");
            }
            cache.discard();
            Err(e)
        }
    }
}
