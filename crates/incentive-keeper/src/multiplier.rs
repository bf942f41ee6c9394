//! Multiplier table: named vesting schedules, matched case-insensitively.

use std::collections::BTreeMap;

use incentive_types::multiplier::{is_well_formed_name, normalize_name};
use incentive_types::MultiplierSpec;
use rust_decimal::Decimal;

use crate::{IncentiveError, Result};

/// Immutable lookup from normalized name to [`MultiplierSpec`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiplierTable {
    specs: BTreeMap<String, MultiplierSpec>,
}

impl MultiplierTable {
    /// Build the table, validating every entry.
    ///
    /// # Errors
    ///
    /// - [`IncentiveError::InvalidParams`] on a malformed or duplicate name,
    ///   or a payout fraction outside (0, 1]
    pub fn from_specs(specs: &[MultiplierSpec]) -> Result<Self> {
        let mut table = BTreeMap::new();
        for spec in specs {
            let name = normalize_name(&spec.name);
            if !is_well_formed_name(&name) {
                return Err(IncentiveError::InvalidParams(format!(
                    "malformed multiplier name '{}'",
                    spec.name
                )));
            }
            if spec.payout_fraction <= Decimal::ZERO || spec.payout_fraction > Decimal::ONE {
                return Err(IncentiveError::InvalidParams(format!(
                    "multiplier '{name}' payout fraction {} outside (0, 1]",
                    spec.payout_fraction
                )));
            }
            let normalized = MultiplierSpec {
                name: name.clone(),
                ..spec.clone()
            };
            if table.insert(name.clone(), normalized).is_some() {
                return Err(IncentiveError::InvalidParams(format!(
                    "duplicate multiplier '{name}'"
                )));
            }
        }
        Ok(Self { specs: table })
    }

    /// Resolve a multiplier by name after lower-casing it.
    ///
    /// # Errors
    ///
    /// - [`IncentiveError::InvalidMultiplier`] if no entry matches
    pub fn get(&self, name: &str) -> Result<&MultiplierSpec> {
        self.specs
            .get(&normalize_name(name))
            .ok_or_else(|| IncentiveError::InvalidMultiplier(name.to_string()))
    }

    pub fn specs(&self) -> impl Iterator<Item = &MultiplierSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MultiplierTable {
        MultiplierTable::from_specs(&[
            MultiplierSpec::new("small", 0, Decimal::new(2, 1)),
            MultiplierSpec::new("Large", 100, Decimal::ONE),
        ])
        .expect("valid table")
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let t = table();
        assert_eq!(t.get("SMALL").expect("small").lockup_blocks, 0);
        assert_eq!(t.get("large").expect("large").name, "large");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_unknown_multiplier() {
        let t = table();
        let result = t.get("medium");
        assert!(matches!(result, Err(IncentiveError::InvalidMultiplier(_))));
    }

    #[test]
    fn test_rejects_out_of_range_fraction() {
        for fraction in [Decimal::ZERO, Decimal::new(11, 1), Decimal::new(-1, 1)] {
            let result = MultiplierTable::from_specs(&[MultiplierSpec::new("x", 0, fraction)]);
            assert!(matches!(result, Err(IncentiveError::InvalidParams(_))));
        }
    }

    #[test]
    fn test_rejects_duplicate_after_normalization() {
        let result = MultiplierTable::from_specs(&[
            MultiplierSpec::new("small", 0, Decimal::ONE),
            MultiplierSpec::new("SMALL", 10, Decimal::ONE),
        ]);
        assert!(matches!(result, Err(IncentiveError::InvalidParams(_))));
    }
}
