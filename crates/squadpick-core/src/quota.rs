// Per-category roster quotas.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::category::Category;
use crate::error::{Infeasibility, SelectionError};
use crate::scorer::ScoredPool;

/// Exact number of players required per category.
///
/// Categories absent from the map have a quota of zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Quotas {
    counts: BTreeMap<Category, usize>,
}

impl Quotas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, category: Category, count: usize) -> Self {
        self.counts.insert(category, count);
        self
    }

    /// Parse a config map keyed by position strings (e.g. `{"GK": 2, "DEF": 4}`).
    ///
    /// Unknown keys are rejected rather than ignored: a typo in a quota key
    /// would otherwise silently shrink the roster.
    pub fn from_config(map: &HashMap<String, usize>) -> Result<Self, SelectionError> {
        let mut quotas = Quotas::new();
        for (key, &count) in map {
            let category = Category::from_str_pos(key).ok_or_else(|| {
                SelectionError::InvalidRequest(format!("unknown quota category '{key}'"))
            })?;
            if quotas.counts.insert(category, count).is_some() {
                return Err(SelectionError::InvalidRequest(format!(
                    "category {category} appears more than once in quotas"
                )));
            }
        }
        Ok(quotas)
    }

    /// Quota for a category (zero when absent).
    pub fn get(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Total roster size implied by the quotas.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Categories with a non-zero quota, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(&c, &n)| (c, n))
    }

    /// A quota map must ask for at least one player.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.total() == 0 {
            return Err(SelectionError::InvalidRequest(
                "quotas must require at least one player".into(),
            ));
        }
        Ok(())
    }
}

/// Shared request validation for the optimizer and the sampler.
///
/// Rejects unusable inputs and detects category shortfalls, which no roster
/// can overcome.
pub(crate) fn validate_request(
    pool: &ScoredPool,
    budget: f64,
    quotas: &Quotas,
) -> Result<(), SelectionError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(SelectionError::InvalidRequest(format!(
            "budget must be a non-negative finite number, got {budget}"
        )));
    }
    quotas.validate()?;

    let mut ids = HashSet::new();
    for c in &pool.candidates {
        if !c.cost.is_finite() || c.cost < 0.0 || !c.projected_value.is_finite() {
            return Err(SelectionError::InvalidRequest(format!(
                "candidate {} ({}) has an invalid cost or projection",
                c.id, c.name
            )));
        }
        if !ids.insert(c.id) {
            return Err(SelectionError::InvalidRequest(format!(
                "candidate id {} appears more than once",
                c.id
            )));
        }
    }

    for (category, required) in quotas.iter() {
        let available = pool
            .candidates
            .iter()
            .filter(|c| c.category == category)
            .count();
        if available < required {
            return Err(SelectionError::Infeasible(Infeasibility::CategoryShortfall {
                category,
                required,
                available,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::ScoredCandidate;

    #[test]
    fn from_config_parses_position_keys() {
        let mut map = HashMap::new();
        map.insert("GK".to_string(), 2);
        map.insert("DEF".to_string(), 4);
        map.insert("MID".to_string(), 5);
        map.insert("FWD".to_string(), 4);
        let quotas = Quotas::from_config(&map).unwrap();
        assert_eq!(quotas.get(Category::Goalkeeper), 2);
        assert_eq!(quotas.get(Category::Forward), 4);
        assert_eq!(quotas.total(), 15);
    }

    #[test]
    fn from_config_rejects_unknown_key() {
        let mut map = HashMap::new();
        map.insert("GK".to_string(), 2);
        map.insert("WING".to_string(), 1);
        assert!(matches!(
            Quotas::from_config(&map),
            Err(SelectionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn from_config_rejects_aliases_of_same_category() {
        let mut map = HashMap::new();
        map.insert("FWD".to_string(), 2);
        map.insert("FW".to_string(), 1);
        assert!(Quotas::from_config(&map).is_err());
    }

    #[test]
    fn iter_skips_zero_quotas_in_display_order() {
        let quotas = Quotas::new()
            .with(Category::Forward, 1)
            .with(Category::Defender, 0)
            .with(Category::Goalkeeper, 1);
        let cats: Vec<Category> = quotas.iter().map(|(c, _)| c).collect();
        assert_eq!(cats, vec![Category::Goalkeeper, Category::Forward]);
    }

    #[test]
    fn empty_quotas_are_invalid() {
        assert!(Quotas::new().validate().is_err());
        assert!(Quotas::new().with(Category::Midfielder, 0).validate().is_err());
    }

    fn cand(id: usize, category: Category) -> ScoredCandidate {
        ScoredCandidate {
            id,
            name: format!("P{id}"),
            team: "Club".into(),
            category,
            cost: 5.0,
            cost_imputed: false,
            projected_value: 3.0,
        }
    }

    #[test]
    fn negative_or_nan_budget_is_invalid() {
        let pool = ScoredPool::new(2, vec![cand(0, Category::Goalkeeper)]);
        let quotas = Quotas::new().with(Category::Goalkeeper, 1);
        assert!(validate_request(&pool, -1.0, &quotas).is_err());
        assert!(validate_request(&pool, f64::NAN, &quotas).is_err());
        assert!(validate_request(&pool, 0.0, &quotas).is_ok());
    }

    #[test]
    fn shortfall_reports_category_and_counts() {
        let pool = ScoredPool::new(
            2,
            vec![cand(0, Category::Goalkeeper), cand(1, Category::Defender)],
        );
        let quotas = Quotas::new()
            .with(Category::Goalkeeper, 1)
            .with(Category::Defender, 3);
        match validate_request(&pool, 100.0, &quotas) {
            Err(SelectionError::Infeasible(Infeasibility::CategoryShortfall {
                category,
                required,
                available,
            })) => {
                assert_eq!(category, Category::Defender);
                assert_eq!(required, 3);
                assert_eq!(available, 1);
            }
            other => panic!("expected CategoryShortfall, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_and_nan_projections_are_invalid() {
        let quotas = Quotas::new().with(Category::Goalkeeper, 1);
        let dup = ScoredPool::new(
            2,
            vec![cand(4, Category::Goalkeeper), cand(4, Category::Goalkeeper)],
        );
        assert!(matches!(
            validate_request(&dup, 10.0, &quotas),
            Err(SelectionError::InvalidRequest(_))
        ));

        let mut bad = cand(1, Category::Goalkeeper);
        bad.projected_value = f64::NAN;
        let nan = ScoredPool::new(2, vec![bad]);
        assert!(matches!(
            validate_request(&nan, 10.0, &quotas),
            Err(SelectionError::InvalidRequest(_))
        ));
    }
}
