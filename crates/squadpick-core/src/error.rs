// Error taxonomy for table validation, scoring and roster selection.

use std::fmt;

use thiserror::Error;

use crate::category::Category;
use crate::forest::ForestError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no training history before period {target_period}")]
    InsufficientHistory { target_period: u32 },

    #[error("no candidates recorded for period {period}")]
    NoCandidatesForPeriod { period: u32 },

    #[error("no feasible roster: {0}")]
    Infeasible(Infeasibility),

    #[error("no random roster within budget {budget} after {attempts} attempts")]
    BaselineUnattainable { attempts: usize, budget: f64 },

    #[error("{} malformed candidate row(s); first: {}", .0.len(), first_malformed(.0))]
    MalformedCandidates(Vec<MalformedCandidate>),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("integer program solver failed: {0}")]
    Solver(String),

    #[error("model error: {0}")]
    Model(#[from] ForestError),

    #[error("roster invariant violated: {0}")]
    RosterInvariant(String),
}

fn first_malformed(rows: &[MalformedCandidate]) -> String {
    rows.first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "none".into())
}

// ---------------------------------------------------------------------------
// Infeasibility detail
// ---------------------------------------------------------------------------

/// Why no roster can satisfy the quotas and the budget.
#[derive(Debug, Clone, PartialEq)]
pub enum Infeasibility {
    /// A category has fewer candidates than its quota.
    CategoryShortfall {
        category: Category,
        required: usize,
        available: usize,
    },
    /// Even the cheapest quota-satisfying roster exceeds the budget.
    OverBudget { minimum_cost: f64, budget: f64 },
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::CategoryShortfall {
                category,
                required,
                available,
            } => write!(
                f,
                "{category} quota needs {required} candidates but only {available} available"
            ),
            Infeasibility::OverBudget {
                minimum_cost,
                budget,
            } => write!(
                f,
                "cheapest roster costs {minimum_cost:.2}, above budget {budget:.2}"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-row validation failures
// ---------------------------------------------------------------------------

/// A candidate row rejected at table-validation time.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedCandidate {
    /// Zero-based row index in the input.
    pub row: usize,
    pub name: String,
    pub reason: MalformedReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MalformedReason {
    MissingPeriod,
    MissingCategory,
    UnknownCategory(String),
    MissingFeature(String),
    NonFiniteFeature(String),
    NegativeCost(f64),
    NonFiniteCost,
    NonFiniteObservedValue,
}

impl fmt::Display for MalformedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): ", self.row, self.name)?;
        match &self.reason {
            MalformedReason::MissingPeriod => write!(f, "missing period"),
            MalformedReason::MissingCategory => write!(f, "missing category"),
            MalformedReason::UnknownCategory(c) => write!(f, "unknown category '{c}'"),
            MalformedReason::MissingFeature(name) => write!(f, "missing feature '{name}'"),
            MalformedReason::NonFiniteFeature(name) => write!(f, "non-finite feature '{name}'"),
            MalformedReason::NegativeCost(c) => write!(f, "negative cost {c}"),
            MalformedReason::NonFiniteCost => write!(f, "non-finite cost"),
            MalformedReason::NonFiniteObservedValue => write!(f, "non-finite observed value"),
        }
    }
}
