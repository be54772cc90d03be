// Optimal-versus-baseline comparison.

use serde::Serialize;

use crate::roster::Roster;

/// Summary of how much the optimal roster gains over a baseline roster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub optimal_value: f64,
    pub baseline_value: f64,
    /// `optimal_value - baseline_value`; never negative for rosters drawn
    /// from the same pool, budget and quotas.
    pub value_gap: f64,
    pub optimal_cost: f64,
    pub baseline_cost: f64,
}

pub fn compare(optimal: &Roster, baseline: &Roster) -> Comparison {
    let optimal_value = optimal.total_projected_value();
    let baseline_value = baseline.total_projected_value();
    Comparison {
        optimal_value,
        baseline_value,
        value_gap: optimal_value - baseline_value,
        optimal_cost: optimal.total_cost(),
        baseline_cost: baseline.total_cost(),
    }
}
