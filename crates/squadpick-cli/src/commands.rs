// Command-line surface and request handling.
//
// Each invocation is one request: load the dataset, retrain the model for the
// requested round, answer, exit. The CPU-bound work runs on the blocking pool
// under the configured timeout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use squadpick_core::{compare, optimize, sample_random, score, CandidateTable, ScoredPool};

use crate::config::Config;
use crate::data;
use crate::report::{ClubReport, CompareReport, LeadersReport, PlayerReport, TeamReport};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "squadpick")]
#[command(about = "Pick a fantasy football squad under a budget")]
pub struct Cli {
    /// Directory holding config/ (and defaults/ on first run)
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Best squad for a round, split into starters and reserves
    Team {
        round: u32,
        /// Overrides selection.budget
        budget: Option<f64>,
        /// Player to mark as captain
        #[arg(long)]
        captain: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Optimal squad against a random squad with the same budget
    Compare {
        round: u32,
        budget: Option<f64>,
        /// Seed for the random squad (overrides baseline.seed)
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },

    /// Projected points of one player
    Player {
        round: u32,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        #[arg(long)]
        json: bool,
    },

    /// Players of a club
    Club {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        #[arg(long)]
        json: bool,
    },

    /// Top players of a round by a stat
    Leaders {
        round: u32,
        #[arg(long, default_value = "goals")]
        stat: String,
        #[arg(long, default_value_t = 3)]
        top: usize,
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    fn json(&self) -> bool {
        match self {
            Command::Team { json, .. }
            | Command::Compare { json, .. }
            | Command::Player { json, .. }
            | Command::Club { json, .. }
            | Command::Leaders { json, .. } => *json,
        }
    }
}

// ---------------------------------------------------------------------------
// Request handlers
// ---------------------------------------------------------------------------

fn budget_or_default(config: &Config, budget: Option<f64>) -> f64 {
    budget.unwrap_or(config.selection.budget)
}

fn scored_pool(
    config: &Config,
    table: &CandidateTable,
    round: u32,
) -> anyhow::Result<ScoredPool> {
    score(table, round, &config.scorer_config())
        .with_context(|| format!("failed to score candidates for round {round}"))
}

/// Optimal squad for `round`, with an optional captain.
///
/// The captain must exist in the dataset; it need not make the squad.
pub fn team(
    config: &Config,
    table: &CandidateTable,
    round: u32,
    budget: Option<f64>,
    captain: Option<&str>,
) -> anyhow::Result<TeamReport> {
    if let Some(name) = captain {
        if !table.contains_player(name) {
            bail!("player '{name}' not found");
        }
    }
    let budget = budget_or_default(config, budget);
    let pool = scored_pool(config, table, round)?;
    let roster = optimize(&pool, budget, &config.quotas)
        .context("failed to select an optimal squad")?;
    info!(
        "Selected squad for round {round}: {} players, cost {:.2}, {:.2} projected pts",
        roster.len(),
        roster.display_cost(),
        roster.total_projected_value()
    );
    Ok(TeamReport::new(round, &roster, &config.lineup, budget, captain))
}

/// Optimal squad against a random feasible squad.
pub fn compare_squads(
    config: &Config,
    table: &CandidateTable,
    round: u32,
    budget: Option<f64>,
    seed: Option<u64>,
) -> anyhow::Result<CompareReport> {
    let budget = budget_or_default(config, budget);
    let pool = scored_pool(config, table, round)?;
    let optimal = optimize(&pool, budget, &config.quotas)
        .context("failed to select an optimal squad")?;
    let random = sample_random(&pool, budget, &config.quotas, &config.sampler_config(seed))
        .context("failed to draw a random squad")?;
    let comparison = compare(&optimal, &random);
    info!(
        "Round {round}: optimal {:.2} pts vs random {:.2} pts",
        comparison.optimal_value, comparison.baseline_value
    );
    Ok(CompareReport {
        round,
        budget,
        comparison,
    })
}

pub fn player(
    config: &Config,
    table: &CandidateTable,
    round: u32,
    name: &str,
) -> anyhow::Result<PlayerReport> {
    let pool = scored_pool(config, table, round)?;
    // Projections cover the players of the last completed round.
    let last_round = round.saturating_sub(1);
    let candidate = pool
        .find_player(name)
        .ok_or_else(|| anyhow!("player '{name}' not found in round {last_round}"))?;
    Ok(PlayerReport::new(round, candidate))
}

pub fn club(table: &CandidateTable, name: &str) -> anyhow::Result<ClubReport> {
    let players = table.team_roster(name);
    if players.is_empty() {
        bail!("club '{name}' not found");
    }
    Ok(ClubReport {
        club: name.to_string(),
        players,
    })
}

pub fn leaders(
    table: &CandidateTable,
    round: u32,
    stat: &str,
    top: usize,
) -> anyhow::Result<LeadersReport> {
    let ranked = table.leaders(round, stat, top)?;
    if ranked.is_empty() {
        bail!("no players recorded in round {round}");
    }
    Ok(LeadersReport::new(round, stat, ranked))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

fn render<T>(report: &T, json: bool) -> anyhow::Result<String>
where
    T: serde::Serialize + std::fmt::Display,
{
    if json {
        serde_json::to_string_pretty(report).context("failed to serialize report")
    } else {
        Ok(report.to_string())
    }
}

/// Run one command against an already-loaded table and render its output.
pub fn execute(
    config: &Config,
    table: &CandidateTable,
    command: &Command,
) -> anyhow::Result<String> {
    let json = command.json();
    match command {
        Command::Team {
            round,
            budget,
            captain,
            ..
        } => render(
            &team(config, table, *round, *budget, captain.as_deref())?,
            json,
        ),
        Command::Compare {
            round,
            budget,
            seed,
            ..
        } => render(&compare_squads(config, table, *round, *budget, *seed)?, json),
        Command::Player { round, name, .. } => {
            render(&player(config, table, *round, &name.join(" "))?, json)
        }
        Command::Club { name, .. } => render(&club(table, &name.join(" "))?, json),
        Command::Leaders {
            round, stat, top, ..
        } => render(&leaders(table, *round, stat, *top)?, json),
    }
}

/// Load the dataset and execute `command` on the blocking pool, bounded by
/// `runtime.request_timeout_secs`.
///
/// On timeout the worker is left to finish in the background; its result is
/// discarded.
pub async fn run(config: Config, command: Command) -> anyhow::Result<String> {
    let secs = config.runtime.request_timeout_secs;
    let task = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
        let path = config.dataset_path();
        let table = data::load_table(&path, &config.dataset, &config.model.features)
            .with_context(|| format!("failed to load dataset {}", path.display()))?;
        execute(&config, &table, &command)
    });

    match tokio::time::timeout(Duration::from_secs(secs), task).await {
        Ok(joined) => joined.context("request worker panicked")?,
        Err(_) => bail!("request timed out after {secs}s"),
    }
}
