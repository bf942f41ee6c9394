//! Parameter validation.

use std::collections::BTreeSet;

use incentive_types::{Params, RewardCategory};

use crate::multiplier::MultiplierTable;
use crate::{IncentiveError, Result};

/// Validate module parameters.
///
/// # Errors
///
/// - [`IncentiveError::InvalidParams`] for a bad multiplier table, an empty
///   reward denom, or an empty / duplicate reward period denom
pub fn validate_params(params: &Params) -> Result<()> {
    MultiplierTable::from_specs(&params.multipliers)?;

    for category in RewardCategory::ALL {
        let cat = params.category(category);
        if cat.reward_denom.trim().is_empty() {
            return Err(IncentiveError::InvalidParams(format!(
                "{category} reward denom is empty"
            )));
        }
        let mut seen = BTreeSet::new();
        for period in &cat.periods {
            if period.denom.trim().is_empty() {
                return Err(IncentiveError::InvalidParams(format!(
                    "{category} reward period with empty denom"
                )));
            }
            if !seen.insert(period.denom.as_str()) {
                return Err(IncentiveError::InvalidParams(format!(
                    "duplicate {category} reward period for {}",
                    period.denom
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use incentive_types::RewardPeriod;

    #[test]
    fn test_default_params_valid() {
        validate_params(&Params::default()).expect("defaults are valid");
    }

    #[test]
    fn test_duplicate_period_rejected() {
        let mut params = Params::default();
        for _ in 0..2 {
            params.hard_supply.periods.push(RewardPeriod {
                denom: "usdc".to_string(),
                rewards_per_block: 1,
            });
        }
        assert!(matches!(
            validate_params(&params),
            Err(IncentiveError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_same_denom_in_different_categories_allowed() {
        let mut params = Params::default();
        let period = RewardPeriod {
            denom: "usdc".to_string(),
            rewards_per_block: 1,
        };
        params.hard_supply.periods.push(period.clone());
        params.hard_borrow.periods.push(period);
        validate_params(&params).expect("valid");
    }

    #[test]
    fn test_empty_reward_denom_rejected() {
        let mut params = Params::default();
        params.usdx_minting.reward_denom = " ".to_string();
        assert!(validate_params(&params).is_err());
    }
}
