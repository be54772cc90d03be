// Plain-text and JSON reports for command output.
//
// Costs are shown to two decimals; every comparison against the budget has
// already happened on unrounded values inside the core.

use std::fmt;

use serde::Serialize;

use squadpick_core::{Category, Comparison, Quotas, Roster, ScoredCandidate};

// ---------------------------------------------------------------------------
// Squad report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PlayerLine {
    pub name: String,
    pub team: String,
    pub category: Category,
    pub projected_value: f64,
    pub cost: f64,
    pub cost_imputed: bool,
    pub captain: bool,
}

impl PlayerLine {
    fn new(candidate: &ScoredCandidate, captain: Option<&str>) -> Self {
        PlayerLine {
            name: candidate.name.clone(),
            team: candidate.team.clone(),
            category: candidate.category,
            projected_value: candidate.projected_value,
            cost: candidate.cost,
            cost_imputed: candidate.cost_imputed,
            captain: captain == Some(candidate.name.as_str()),
        }
    }
}

impl fmt::Display for PlayerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.captain { " (C)" } else { "" };
        let imputed = if self.cost_imputed { "*" } else { "" };
        write!(
            f,
            "  {:<3} {}{} ({}) - {:.2} pts, cost {:.2}{}",
            self.category.display_str(),
            self.name,
            marker,
            self.team,
            self.projected_value,
            self.cost,
            imputed
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub round: u32,
    pub budget: f64,
    pub captain: Option<String>,
    pub starters: Vec<PlayerLine>,
    pub reserves: Vec<PlayerLine>,
    pub total_cost: f64,
    pub total_projected_value: f64,
}

impl TeamReport {
    pub fn new(
        round: u32,
        roster: &Roster,
        lineup: &Quotas,
        budget: f64,
        captain: Option<&str>,
    ) -> Self {
        let split = roster.split_lineup(lineup);
        TeamReport {
            round,
            budget,
            captain: captain.map(str::to_string),
            starters: split
                .starters
                .iter()
                .map(|c| PlayerLine::new(c, captain))
                .collect(),
            reserves: split
                .reserves
                .iter()
                .map(|c| PlayerLine::new(c, captain))
                .collect(),
            total_cost: roster.display_cost(),
            total_projected_value: roster.total_projected_value(),
        }
    }

    /// Whether the requested captain made the squad.
    pub fn captain_in_squad(&self) -> bool {
        self.starters
            .iter()
            .chain(&self.reserves)
            .any(|p| p.captain)
    }
}

impl fmt::Display for TeamReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Squad for round {} (budget {:.2})", self.round, self.budget)?;
        writeln!(f)?;
        writeln!(f, "Starting lineup:")?;
        for player in &self.starters {
            writeln!(f, "{player}")?;
        }
        writeln!(f)?;
        writeln!(f, "Reserves:")?;
        for player in &self.reserves {
            writeln!(f, "{player}")?;
        }
        writeln!(f)?;
        if let Some(captain) = &self.captain {
            if !self.captain_in_squad() {
                writeln!(f, "Captain {captain} is not in this squad.")?;
            }
        }
        if self
            .starters
            .iter()
            .chain(&self.reserves)
            .any(|p| p.cost_imputed)
        {
            writeln!(f, "* cost not recorded, default used")?;
        }
        writeln!(f, "Total cost: {:.2}", self.total_cost)?;
        write!(f, "Total projected points: {:.2}", self.total_projected_value)
    }
}

// ---------------------------------------------------------------------------
// Optimal vs random
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub round: u32,
    pub budget: f64,
    #[serde(flatten)]
    pub comparison: Comparison,
}

impl fmt::Display for CompareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.comparison;
        writeln!(
            f,
            "Optimal vs random squad for round {} (budget {:.2})",
            self.round, self.budget
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "  optimal: {:.2} pts, cost {:.2}",
            c.optimal_value, c.optimal_cost
        )?;
        writeln!(
            f,
            "  random:  {:.2} pts, cost {:.2}",
            c.baseline_value, c.baseline_cost
        )?;
        writeln!(f)?;
        write!(f, "Gap: {:+.2} pts in favour of the optimal squad", c.value_gap)
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub round: u32,
    pub name: String,
    pub team: String,
    pub category: Category,
    pub projected_value: f64,
    pub cost: f64,
    pub cost_imputed: bool,
}

impl PlayerReport {
    pub fn new(round: u32, candidate: &ScoredCandidate) -> Self {
        PlayerReport {
            round,
            name: candidate.name.clone(),
            team: candidate.team.clone(),
            category: candidate.category,
            projected_value: candidate.projected_value,
            cost: candidate.cost,
            cost_imputed: candidate.cost_imputed,
        }
    }
}

impl fmt::Display for PlayerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} is projected {:.2} pts in round {}",
            self.name, self.projected_value, self.round
        )?;
        write!(
            f,
            "Position: {}, club: {}, cost {:.2}{}",
            self.category,
            self.team,
            self.cost,
            if self.cost_imputed { " (default)" } else { "" }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClubReport {
    pub club: String,
    pub players: Vec<String>,
}

impl fmt::Display for ClubReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Players of {}:", self.club)?;
        for name in &self.players {
            write!(f, "\n  {name}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Leader {
    pub rank: usize,
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadersReport {
    pub round: u32,
    pub stat: String,
    pub leaders: Vec<Leader>,
}

impl LeadersReport {
    pub fn new(round: u32, stat: &str, ranked: Vec<(String, f64)>) -> Self {
        LeadersReport {
            round,
            stat: stat.to_string(),
            leaders: ranked
                .into_iter()
                .enumerate()
                .map(|(i, (name, total))| Leader {
                    rank: i + 1,
                    name,
                    total,
                })
                .collect(),
        }
    }
}

impl fmt::Display for LeadersReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Top {} by {} in round {}:", self.leaders.len(), self.stat, self.round)?;
        for leader in &self.leaders {
            write!(f, "\n  {}. {} - {}", leader.rank, leader.name, leader.total)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
