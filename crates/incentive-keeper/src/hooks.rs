//! Position lifecycle hooks.
//!
//! External position modules call these around every mutation. Creation
//! starts tracking a denom; modification first folds in reward earned at
//! the old size.
//!
//! `after_position_modified` does not start tracking denoms newly added to
//! an existing position. A supply deposit that gains a second denom must
//! still be initialized through `before_position_created` for that denom,
//! otherwise the next `before_position_modified` on it aborts with
//! [`IncentiveError::MissingClaim`](crate::IncentiveError::MissingClaim).

use incentive_db::KvStore;
use incentive_types::PositionSnapshot;

use crate::keeper::Keeper;
use crate::sync;
use crate::Result;

/// Callbacks invoked by position-maintaining modules.
///
/// Every error returned is fatal: the caller must abort the transition.
pub trait PositionHooks<S: KvStore + ?Sized> {
    /// A CDP was opened.
    fn after_position_created(
        &self,
        store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()>;

    /// A supply or borrow deposit is about to be opened.
    fn before_position_created(
        &self,
        store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()>;

    /// A position is about to change; `position` still holds the old size.
    fn before_position_modified(
        &self,
        store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()>;

    /// A position changed.
    fn after_position_modified(
        &self,
        store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()>;
}

impl<S: KvStore + ?Sized> PositionHooks<S> for Keeper {
    fn after_position_created(
        &self,
        store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()> {
        tracing::debug!(kind = ?position.kind, owner = %position.owner, denom, "after_position_created");
        sync::initialize_claim(store, position.kind.category(), &position.owner, denom)?;
        Ok(())
    }

    fn before_position_created(
        &self,
        store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()> {
        tracing::debug!(kind = ?position.kind, owner = %position.owner, denom, "before_position_created");
        sync::initialize_claim(store, position.kind.category(), &position.owner, denom)?;
        Ok(())
    }

    fn before_position_modified(
        &self,
        store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()> {
        tracing::debug!(kind = ?position.kind, owner = %position.owner, denom, "before_position_modified");
        sync::synchronize_claim(
            store,
            position.kind.category(),
            &position.owner,
            denom,
            position.size_of(denom),
        )?;
        Ok(())
    }

    fn after_position_modified(
        &self,
        _store: &mut S,
        position: &PositionSnapshot,
        denom: &str,
    ) -> Result<()> {
        // TODO: initialize claims for denoms first seen on an existing position.
        tracing::debug!(kind = ?position.kind, owner = %position.owner, denom, "after_position_modified: no-op");
        Ok(())
    }
}
