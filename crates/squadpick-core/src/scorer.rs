// Projected value scoring.
//
// Trains a random forest on every observation before the target period and
// projects the next-period value of each player seen in the most recently
// completed period (target - 1). The model lives only for one call.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::category::Category;
use crate::error::SelectionError;
use crate::forest::{ForestParams, RandomForest};
use crate::table::{CandidateRecord, CandidateTable};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    /// Cost assigned to candidates with no recorded cost.
    pub default_cost: f64,
    pub forest: ForestParams,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig {
            default_cost: 5.0,
            forest: ForestParams::default(),
        }
    }
}

/// A candidate of the projected period, ready for roster selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub id: usize,
    pub name: String,
    pub team: String,
    pub category: Category,
    /// Recorded cost, or the configured default when none was recorded.
    pub cost: f64,
    pub cost_imputed: bool,
    pub projected_value: f64,
}

/// Scored candidates for one target period.
///
/// Projected values are only comparable within a single pool.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPool {
    pub target_period: u32,
    pub candidates: Vec<ScoredCandidate>,
}

impl ScoredPool {
    pub fn new(target_period: u32, candidates: Vec<ScoredCandidate>) -> Self {
        ScoredPool {
            target_period,
            candidates,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Case-insensitive lookup of a player's projection.
    pub fn find_player(&self, name: &str) -> Option<&ScoredCandidate> {
        let wanted = name.trim().to_lowercase();
        self.candidates
            .iter()
            .find(|c| c.name.to_lowercase() == wanted)
    }
}

/// Training and prediction subsets for a target period.
#[derive(Debug)]
pub struct HistorySplit<'a> {
    /// Observations strictly before the target period that have an outcome.
    pub training: Vec<&'a CandidateRecord>,
    /// Observations from the period immediately before the target.
    pub prediction: Vec<&'a CandidateRecord>,
}

// ---------------------------------------------------------------------------
// History split
// ---------------------------------------------------------------------------

/// Partition the table around `target_period`.
pub fn history_split(
    table: &CandidateTable,
    target_period: u32,
) -> Result<HistorySplit<'_>, SelectionError> {
    let training: Vec<&CandidateRecord> = table
        .records()
        .iter()
        .filter(|r| r.period < target_period && r.observed_value.is_some())
        .collect();
    if training.is_empty() {
        return Err(SelectionError::InsufficientHistory { target_period });
    }

    // target_period >= 1 here: a non-empty history implies some period below it.
    let last_completed = target_period - 1;
    let prediction: Vec<&CandidateRecord> = table
        .records()
        .iter()
        .filter(|r| r.period == last_completed)
        .collect();
    if prediction.is_empty() {
        return Err(SelectionError::NoCandidatesForPeriod {
            period: last_completed,
        });
    }

    Ok(HistorySplit {
        training,
        prediction,
    })
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Project values for the candidates of `target_period - 1`.
pub fn score(
    table: &CandidateTable,
    target_period: u32,
    config: &ScorerConfig,
) -> Result<ScoredPool, SelectionError> {
    if !config.default_cost.is_finite() || config.default_cost < 0.0 {
        return Err(SelectionError::InvalidRequest(format!(
            "default cost must be a non-negative finite number, got {}",
            config.default_cost
        )));
    }

    let split = history_split(table, target_period)?;

    let x: Vec<Vec<f64>> = split.training.iter().map(|r| r.features.clone()).collect();
    let y: Vec<f64> = split
        .training
        .iter()
        .filter_map(|r| r.observed_value)
        .collect();
    let model = RandomForest::fit(&x, &y, &config.forest)?;

    let mut candidates = Vec::with_capacity(split.prediction.len());
    let mut imputed = 0usize;
    for record in &split.prediction {
        let projected_value = model.predict(&record.features)?;
        let (cost, cost_imputed) = match record.cost {
            Some(c) => (c, false),
            None => {
                imputed += 1;
                debug!(
                    "imputing cost {} for '{}' (row {})",
                    config.default_cost, record.name, record.id
                );
                (config.default_cost, true)
            }
        };
        candidates.push(ScoredCandidate {
            id: record.id,
            name: record.name.clone(),
            team: record.team.clone(),
            category: record.category,
            cost,
            cost_imputed,
            projected_value,
        });
    }

    if imputed > 0 {
        warn!(
            "{imputed} candidate(s) in period {} have no cost; using {}",
            target_period - 1,
            config.default_cost
        );
    }

    info!(
        target_period,
        training_rows = split.training.len(),
        candidates = candidates.len(),
        imputed_costs = imputed,
        "scored candidate pool"
    );

    Ok(ScoredPool::new(target_period, candidates))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
