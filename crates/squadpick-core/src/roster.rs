// Selected rosters and the shared feasibility definition.

use std::collections::HashSet;

use serde::Serialize;

use crate::category::Category;
use crate::error::SelectionError;
use crate::quota::Quotas;
use crate::scorer::ScoredCandidate;

/// Absolute slack allowed when comparing an unrounded cost sum to a budget.
///
/// Absorbs float accumulation noise only (sums like 0.1 + 0.2); it is far
/// below any real price increment.
pub const BUDGET_TOLERANCE: f64 = 1e-9;

/// Whether a total cost is within budget.
///
/// The optimizer and the sampler both use this, so their feasible regions
/// are identical.
pub fn fits_budget(total_cost: f64, budget: f64) -> bool {
    total_cost <= budget + BUDGET_TOLERANCE
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// An immutable selection of scored candidates.
///
/// Members are kept in category display order, best projection first.
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    members: Vec<ScoredCandidate>,
    /// Exact, unrounded sum of member costs.
    total_cost: f64,
}

impl Roster {
    pub(crate) fn from_members(mut members: Vec<ScoredCandidate>) -> Self {
        members.sort_by(|a, b| {
            a.category
                .sort_order()
                .cmp(&b.category.sort_order())
                .then_with(|| {
                    b.projected_value
                        .partial_cmp(&a.projected_value)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        let total_cost = members.iter().map(|m| m.cost).sum();
        Roster {
            members,
            total_cost,
        }
    }

    pub fn members(&self) -> &[ScoredCandidate] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Total cost rounded to two decimals, for display only.
    pub fn display_cost(&self) -> f64 {
        (self.total_cost * 100.0).round() / 100.0
    }

    pub fn total_projected_value(&self) -> f64 {
        self.members.iter().map(|m| m.projected_value).sum()
    }

    pub fn count(&self, category: Category) -> usize {
        self.members
            .iter()
            .filter(|m| m.category == category)
            .count()
    }

    /// Check every roster invariant against the request that produced it.
    pub fn verify(&self, quotas: &Quotas, budget: f64) -> Result<(), SelectionError> {
        for category in Category::ALL {
            let have = self.count(category);
            let want = quotas.get(category);
            if have != want {
                return Err(SelectionError::RosterInvariant(format!(
                    "{category}: selected {have}, quota {want}"
                )));
            }
        }
        if self.members.len() != quotas.total() {
            return Err(SelectionError::RosterInvariant(format!(
                "selected {} players, quotas total {}",
                self.members.len(),
                quotas.total()
            )));
        }
        if !fits_budget(self.total_cost, budget) {
            return Err(SelectionError::RosterInvariant(format!(
                "total cost {} exceeds budget {budget}",
                self.total_cost
            )));
        }
        let mut ids = HashSet::new();
        if let Some(dup) = self.members.iter().find(|m| !ids.insert(m.id)) {
            return Err(SelectionError::RosterInvariant(format!(
                "candidate {} ({}) selected twice",
                dup.id, dup.name
            )));
        }
        Ok(())
    }

    /// Split into starters and reserves.
    ///
    /// Within each category the highest projections start, up to the
    /// starting quota; everyone else is a reserve.
    pub fn split_lineup(&self, starting: &Quotas) -> Lineup {
        let mut lineup = Lineup::default();
        for category in Category::ALL {
            let slots = starting.get(category);
            for (rank, member) in self
                .members
                .iter()
                .filter(|m| m.category == category)
                .enumerate()
            {
                if rank < slots {
                    lineup.starters.push(member.clone());
                } else {
                    lineup.reserves.push(member.clone());
                }
            }
        }
        lineup
    }
}

/// A roster split into starting and reserve players.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Lineup {
    pub starters: Vec<ScoredCandidate>,
    pub reserves: Vec<ScoredCandidate>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
