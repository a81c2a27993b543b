//! Immersion levels and per-season episode budgets.
//!
//! A viewer picks how deep they want to go (1 = bare minimum, 5 = thorough).
//! The level maps to a per-season cap on selected episodes through a
//! `BudgetPolicy`. Every policy yields at least one episode and never shrinks
//! as the level rises.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised when building a budget policy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BudgetError {
    #[error("Immersion level {level} has a budget of 0; every level needs at least 1 episode")]
    ZeroBudget { level: u8 },

    #[error("Budget for level {level} ({budget}) is below level {previous_level} ({previous})")]
    Decreasing {
        level: u8,
        budget: usize,
        previous_level: u8,
        previous: usize,
    },

    #[error("Unknown immersion level {0}; levels run from 1 to 5")]
    UnknownLevel(u8),

    #[error("Immersion level key {0:?} is not a number")]
    InvalidLevelKey(String),

    #[error("Proportional budgets need a per-season maximum of at least 1")]
    ZeroMaximum,
}

// =============================================================================
// ImmersionLevel
// =============================================================================

/// Immersion preference, always within [1, 5]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct ImmersionLevel(u8);

impl ImmersionLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Clamp any integer into the valid range. Out-of-range input is never an error.
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every level, lowest first
    pub fn all() -> impl Iterator<Item = ImmersionLevel> {
        (Self::MIN..=Self::MAX).map(ImmersionLevel)
    }
}

impl Default for ImmersionLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl From<i64> for ImmersionLevel {
    fn from(level: i64) -> Self {
        Self::clamped(level)
    }
}

impl From<ImmersionLevel> for u8 {
    fn from(level: ImmersionLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for ImmersionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// BudgetTable
// =============================================================================

/// Fixed level -> budget lookup, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>", into = "BTreeMap<String, usize>")]
pub struct BudgetTable([usize; 5]);

impl BudgetTable {
    pub const DEFAULT_BUDGETS: [usize; 5] = [1, 2, 3, 4, 6];

    /// Budgets for levels 1 through 5.
    ///
    /// Rejects a zero budget and any level whose budget is below the
    /// previous level's.
    pub fn new(budgets: [usize; 5]) -> Result<Self, BudgetError> {
        let mut previous: Option<(u8, usize)> = None;
        for (i, &budget) in budgets.iter().enumerate() {
            let level = i as u8 + ImmersionLevel::MIN;
            if budget == 0 {
                return Err(BudgetError::ZeroBudget { level });
            }
            if let Some((previous_level, previous_budget)) = previous {
                if budget < previous_budget {
                    return Err(BudgetError::Decreasing {
                        level,
                        budget,
                        previous_level,
                        previous: previous_budget,
                    });
                }
            }
            previous = Some((level, budget));
        }
        Ok(Self(budgets))
    }

    /// Start from the defaults and replace the given levels
    pub fn with_overrides(overrides: &BTreeMap<u8, usize>) -> Result<Self, BudgetError> {
        let mut budgets = Self::DEFAULT_BUDGETS;
        for (&level, &budget) in overrides {
            if !(ImmersionLevel::MIN..=ImmersionLevel::MAX).contains(&level) {
                return Err(BudgetError::UnknownLevel(level));
            }
            budgets[usize::from(level - ImmersionLevel::MIN)] = budget;
        }
        Self::new(budgets)
    }

    pub fn budget(&self, level: ImmersionLevel) -> usize {
        self.0[usize::from(level.get() - ImmersionLevel::MIN)]
    }
}

impl Default for BudgetTable {
    fn default() -> Self {
        Self(Self::DEFAULT_BUDGETS)
    }
}

// JSON object keys are always strings, so the table travels as "level" -> budget
impl TryFrom<BTreeMap<String, usize>> for BudgetTable {
    type Error = BudgetError;

    fn try_from(raw: BTreeMap<String, usize>) -> Result<Self, Self::Error> {
        let mut overrides = BTreeMap::new();
        for (key, budget) in raw {
            let level: i64 = key
                .trim()
                .parse()
                .map_err(|_| BudgetError::InvalidLevelKey(key.clone()))?;
            match u8::try_from(level) {
                Ok(level) if (ImmersionLevel::MIN..=ImmersionLevel::MAX).contains(&level) => {
                    overrides.insert(level, budget);
                }
                Ok(level) => return Err(BudgetError::UnknownLevel(level)),
                Err(_) => return Err(BudgetError::InvalidLevelKey(key)),
            }
        }
        Self::with_overrides(&overrides)
    }
}

impl From<BudgetTable> for BTreeMap<String, usize> {
    fn from(table: BudgetTable) -> Self {
        ImmersionLevel::all()
            .map(|level| (level.to_string(), table.budget(level)))
            .collect()
    }
}

// =============================================================================
// BudgetPolicy
// =============================================================================

/// How a season's budget is derived from the immersion level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetPolicy {
    /// Fixed lookup table, independent of season size
    Table {
        #[serde(default)]
        levels: BudgetTable,
    },

    /// `ceil(season_size * (0.1 + 0.1 * level))`, clamped to `[1, max_per_season]`
    Proportional { max_per_season: usize },
}

impl BudgetPolicy {
    pub fn proportional(max_per_season: usize) -> Result<Self, BudgetError> {
        let policy = BudgetPolicy::Proportional { max_per_season };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), BudgetError> {
        match self {
            BudgetPolicy::Table { .. } => Ok(()),
            BudgetPolicy::Proportional { max_per_season: 0 } => Err(BudgetError::ZeroMaximum),
            BudgetPolicy::Proportional { .. } => Ok(()),
        }
    }

    /// Budget for one season holding `season_size` candidate episodes
    pub fn budget_for(&self, level: ImmersionLevel, season_size: usize) -> usize {
        match self {
            BudgetPolicy::Table { levels } => levels.budget(level),
            BudgetPolicy::Proportional { max_per_season } => {
                // ceil(size * (1 + level) / 10) in integers
                let tenths = season_size * (1 + usize::from(level.get()));
                let budget = tenths.div_ceil(10);
                budget.clamp(1, (*max_per_season).max(1))
            }
        }
    }
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        BudgetPolicy::Table {
            levels: BudgetTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immersion_is_clamped() {
        assert_eq!(ImmersionLevel::clamped(-3).get(), 1);
        assert_eq!(ImmersionLevel::clamped(0).get(), 1);
        assert_eq!(ImmersionLevel::clamped(4).get(), 4);
        assert_eq!(ImmersionLevel::clamped(99).get(), 5);
        assert_eq!(ImmersionLevel::default().get(), 3);
    }

    #[test]
    fn test_default_table() {
        let table = BudgetTable::default();
        let budgets: Vec<usize> = ImmersionLevel::all().map(|l| table.budget(l)).collect();
        assert_eq!(budgets, vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_table_rejects_zero_and_decreasing_budgets() {
        assert_eq!(
            BudgetTable::new([0, 2, 3, 4, 5]),
            Err(BudgetError::ZeroBudget { level: 1 })
        );
        assert!(matches!(
            BudgetTable::new([1, 3, 2, 4, 5]),
            Err(BudgetError::Decreasing { level: 3, .. })
        ));
        assert!(BudgetTable::new([2, 2, 2, 2, 2]).is_ok());
    }

    #[test]
    fn test_table_overrides() {
        let overrides = BTreeMap::from([(5, 10)]);
        let table = BudgetTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.budget(ImmersionLevel::clamped(5)), 10);
        assert_eq!(table.budget(ImmersionLevel::clamped(1)), 1);

        let bad_level = BTreeMap::from([(6, 10)]);
        assert_eq!(
            BudgetTable::with_overrides(&bad_level),
            Err(BudgetError::UnknownLevel(6))
        );
    }

    #[test]
    fn test_every_policy_is_monotonic_and_positive() {
        let policies = [
            BudgetPolicy::default(),
            BudgetPolicy::proportional(8).unwrap(),
            BudgetPolicy::proportional(1).unwrap(),
        ];
        for policy in policies {
            for season_size in [0, 1, 3, 10, 40] {
                let budgets: Vec<usize> = ImmersionLevel::all()
                    .map(|level| policy.budget_for(level, season_size))
                    .collect();
                assert!(budgets.iter().all(|b| *b >= 1), "{:?}", policy);
                assert!(budgets.windows(2).all(|w| w[0] <= w[1]), "{:?}", policy);
            }
        }
    }

    #[test]
    fn test_proportional_budget() {
        let policy = BudgetPolicy::proportional(8).unwrap();
        // 10 episodes at level 3: ceil(10 * 0.4) = 4
        assert_eq!(policy.budget_for(ImmersionLevel::clamped(3), 10), 4);
        // Capped at the maximum
        assert_eq!(policy.budget_for(ImmersionLevel::clamped(5), 40), 8);
        assert_eq!(BudgetPolicy::proportional(0), Err(BudgetError::ZeroMaximum));
    }

    #[test]
    fn test_table_policy_reads_string_level_keys() {
        let policy: BudgetPolicy =
            serde_json::from_str(r#"{"kind": "table", "levels": {"4": 5, "5": 8}}"#).unwrap();
        assert_eq!(
            policy,
            BudgetPolicy::Table {
                levels: BudgetTable::new([1, 2, 3, 5, 8]).unwrap()
            }
        );

        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(serde_json::from_str::<BudgetPolicy>(&json).unwrap(), policy);
    }

    #[test]
    fn test_table_level_keys_are_checked() {
        assert_eq!(
            BudgetTable::try_from(BTreeMap::from([("6".to_string(), 10)])),
            Err(BudgetError::UnknownLevel(6))
        );
        assert_eq!(
            BudgetTable::try_from(BTreeMap::from([("0".to_string(), 10)])),
            Err(BudgetError::UnknownLevel(0))
        );
        assert_eq!(
            BudgetTable::try_from(BTreeMap::from([("deep".to_string(), 10)])),
            Err(BudgetError::InvalidLevelKey("deep".to_string()))
        );
        assert_eq!(
            BudgetTable::try_from(BTreeMap::from([("-1".to_string(), 10)])),
            Err(BudgetError::InvalidLevelKey("-1".to_string()))
        );

        let result =
            serde_json::from_str::<BudgetPolicy>(r#"{"kind": "table", "levels": {"9": 3}}"#);
        assert!(result.unwrap_err().to_string().contains("Unknown immersion level 9"));
    }
}
