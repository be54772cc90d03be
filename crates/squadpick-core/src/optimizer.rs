// Exact roster optimization.
//
// Solves the 0/1 program
//
//   maximize    sum(value_i * x_i)
//   subject to  sum(cost_i * x_i) <= budget
//               sum(x_i for i in category c) == quota_c   for every c
//               sum(x_i) == sum(quota_c)
//
// with good_lp on the microlp backend. Feasibility is decided exactly before
// solving: the problem is feasible iff every category has enough candidates
// and the cheapest quota-filling roster fits the budget.

use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use tracing::debug;

use crate::error::{Infeasibility, SelectionError};
use crate::quota::{validate_request, Quotas};
use crate::roster::{fits_budget, Roster, BUDGET_TOLERANCE};
use crate::scorer::ScoredPool;

/// Value-maximizing roster under the budget and quotas.
///
/// Fails with `Infeasible` when no roster satisfies the constraints. Among
/// equally valued optima the choice is unspecified.
pub fn optimize(pool: &ScoredPool, budget: f64, quotas: &Quotas) -> Result<Roster, SelectionError> {
    validate_request(pool, budget, quotas)?;

    let minimum_cost = cheapest_roster_cost(pool, quotas);
    if !fits_budget(minimum_cost, budget) {
        return Err(SelectionError::Infeasible(Infeasibility::OverBudget {
            minimum_cost,
            budget,
        }));
    }

    // One binary per candidate whose category has a seat to fill.
    let mut vars = ProblemVariables::new();
    let picks: Vec<(usize, Variable)> = pool
        .candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| quotas.get(c.category) > 0)
        .map(|(index, _)| (index, vars.add(variable().binary())))
        .collect();

    let objective = picks.iter().fold(Expression::from(0.0), |acc, &(i, x)| {
        acc + pool.candidates[i].projected_value * x
    });
    let mut problem = vars.maximise(objective).using(microlp);

    let spend = picks.iter().fold(Expression::from(0.0), |acc, &(i, x)| {
        acc + pool.candidates[i].cost * x
    });
    let limit = budget + BUDGET_TOLERANCE;
    problem = problem.with(constraint!(spend <= limit));

    for (category, quota) in quotas.iter() {
        let picked = picks
            .iter()
            .filter(|&&(i, _)| pool.candidates[i].category == category)
            .fold(Expression::from(0.0), |acc, &(_, x)| acc + x);
        let seats = quota as f64;
        problem = problem.with(constraint!(picked == seats));
    }

    let everyone = picks
        .iter()
        .fold(Expression::from(0.0), |acc, &(_, x)| acc + x);
    let squad_size = quotas.total() as f64;
    problem = problem.with(constraint!(everyone == squad_size));

    let solution = problem.solve().map_err(|e| match e {
        ResolutionError::Infeasible => SelectionError::Infeasible(Infeasibility::OverBudget {
            minimum_cost,
            budget,
        }),
        other => SelectionError::Solver(other.to_string()),
    })?;

    let members = picks
        .iter()
        .filter(|&&(_, x)| solution.value(x) > 0.5)
        .map(|&(i, _)| pool.candidates[i].clone())
        .collect();
    let roster = Roster::from_members(members);
    roster.verify(quotas, budget)?;

    debug!(
        candidates = picks.len(),
        value = roster.total_projected_value(),
        cost = roster.total_cost(),
        "roster optimization finished"
    );

    Ok(roster)
}

/// Cost of the cheapest roster that fills every quota, ignoring value.
fn cheapest_roster_cost(pool: &ScoredPool, quotas: &Quotas) -> f64 {
    quotas
        .iter()
        .map(|(category, quota)| {
            let mut costs: Vec<f64> = pool
                .candidates
                .iter()
                .filter(|c| c.category == category)
                .map(|c| c.cost)
                .collect();
            costs.sort_by(|a, b| a.total_cmp(b));
            costs.iter().take(quota).sum::<f64>()
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
