// Random baseline rosters.
//
// Rejection sampling: draw each category's quota uniformly at random without
// replacement, keep the first roster that fits the budget. The result is
// feasible but deliberately naive; it is the yardstick for the optimizer.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::error::SelectionError;
use crate::quota::{validate_request, Quotas};
use crate::roster::{fits_budget, Roster};
use crate::scorer::{ScoredCandidate, ScoredPool};

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    pub max_attempts: usize,
    /// `Some` makes the draws reproducible; `None` seeds from OS entropy so
    /// repeated calls explore different rosters.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            max_attempts: 1000,
            seed: None,
        }
    }
}

/// Draw a random roster that satisfies the quotas and the budget.
///
/// Fails with `BaselineUnattainable` when no draw fits within
/// `max_attempts`, even though the optimizer may still find a roster.
pub fn sample_random(
    pool: &ScoredPool,
    budget: f64,
    quotas: &Quotas,
    config: &SamplerConfig,
) -> Result<Roster, SelectionError> {
    validate_request(pool, budget, quotas)?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let by_category: Vec<(Vec<&ScoredCandidate>, usize)> = quotas
        .iter()
        .map(|(category, quota)| {
            let members = pool
                .candidates
                .iter()
                .filter(|c| c.category == category)
                .collect();
            (members, quota)
        })
        .collect();

    for attempt in 1..=config.max_attempts {
        let draw: Vec<&ScoredCandidate> = by_category
            .iter()
            .flat_map(|(members, quota)| members.choose_multiple(&mut rng, *quota).copied())
            .collect();

        let total_cost: f64 = draw.iter().map(|c| c.cost).sum();
        if fits_budget(total_cost, budget) {
            debug!(attempt, cost = total_cost, "random roster accepted");
            let roster = Roster::from_members(draw.into_iter().cloned().collect());
            roster.verify(quotas, budget)?;
            return Ok(roster);
        }
    }

    Err(SelectionError::BaselineUnattainable {
        attempts: config.max_attempts,
        budget,
    })
}
