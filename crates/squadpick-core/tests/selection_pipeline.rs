// End-to-end tests: raw rows -> table -> scored pool -> optimal and random rosters.

use std::collections::HashMap;

use squadpick_core::forest::ForestParams;
use squadpick_core::{
    compare, optimize, sample_random, score, CandidateTable, Category, Infeasibility, Quotas,
    RawCandidate, SamplerConfig, ScorerConfig, SelectionError,
};

// ===========================================================================
// Fixtures
// ===========================================================================

const FEATURES: [&str; 3] = ["goals", "assists", "minutes"];

fn feature_names() -> Vec<String> {
    FEATURES.iter().map(|f| f.to_string()).collect()
}

/// 22 players over three rounds. Costs of `Mid 6` and `Fwd 5` are missing
/// in round 2.
fn raw_rows() -> Vec<RawCandidate> {
    let squad: &[(&str, usize)] = &[("GK", 3), ("DEF", 6), ("MID", 7), ("FWD", 6)];
    let mut rows = Vec::new();
    for round in 1..=3u32 {
        let mut n = 0usize;
        for &(pos, count) in squad {
            for i in 0..count {
                n += 1;
                let name = format!("{} {}", pos_label(pos), i);
                let goals = ((n * 3 + round as usize) % 4) as f64;
                let assists = ((n + 2 * round as usize) % 3) as f64;
                let minutes = 45.0 + ((n * 7) % 46) as f64;
                let mut features = HashMap::new();
                features.insert("goals".to_string(), goals);
                features.insert("assists".to_string(), assists);
                features.insert("minutes".to_string(), minutes);

                let missing_cost = round == 2 && (name == "Mid 6" || name == "Fwd 5");
                rows.push(RawCandidate {
                    name,
                    team: if n % 2 == 0 { "Rovers" } else { "United" }.to_string(),
                    period: Some(round),
                    category: Some(pos.to_string()),
                    cost: if missing_cost {
                        None
                    } else {
                        Some(4.0 + (n % 5) as f64 * 0.5)
                    },
                    features,
                    observed_value: Some(goals * 4.0 + assists * 3.0 + minutes / 45.0),
                });
            }
        }
    }
    rows
}

fn pos_label(pos: &str) -> &'static str {
    match pos {
        "GK" => "Keeper",
        "DEF" => "Back",
        "MID" => "Mid",
        _ => "Fwd",
    }
}

fn table() -> CandidateTable {
    CandidateTable::from_raw(&feature_names(), raw_rows()).unwrap()
}

fn scorer_config() -> ScorerConfig {
    ScorerConfig {
        forest: ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        },
        ..ScorerConfig::default()
    }
}

fn quotas() -> Quotas {
    Quotas::new()
        .with(Category::Goalkeeper, 2)
        .with(Category::Defender, 4)
        .with(Category::Midfielder, 5)
        .with(Category::Forward, 4)
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn scoring_projects_the_last_completed_round() {
    let pool = score(&table(), 3, &scorer_config()).unwrap();
    assert_eq!(pool.target_period, 3);
    assert_eq!(pool.len(), 22);

    let records = table();
    for candidate in &pool.candidates {
        assert_eq!(records.records()[candidate.id].period, 2);
        assert!(candidate.projected_value.is_finite());
    }
}

#[test]
fn missing_costs_are_imputed_not_dropped() {
    let pool = score(&table(), 3, &scorer_config()).unwrap();
    for name in ["Mid 6", "Fwd 5"] {
        let c = pool.find_player(name).unwrap();
        assert!(c.cost_imputed, "{name} should be imputed");
        assert_eq!(c.cost, 5.0);
    }
    assert_eq!(pool.candidates.iter().filter(|c| c.cost_imputed).count(), 2);
}

#[test]
fn imputed_costs_are_carried_into_selected_rosters() {
    let pool = score(&table(), 3, &scorer_config()).unwrap();
    let default_cost = scorer_config().default_cost;
    // Every midfielder and forward must be picked, so both imputed players are in.
    let everyone = Quotas::new()
        .with(Category::Midfielder, 7)
        .with(Category::Forward, 6);
    let budget = 200.0;

    let optimal = optimize(&pool, budget, &everyone).unwrap();
    let baseline = sample_random(
        &pool,
        budget,
        &everyone,
        &SamplerConfig {
            seed: Some(3),
            ..SamplerConfig::default()
        },
    )
    .unwrap();

    for roster in [&optimal, &baseline] {
        let imputed: Vec<_> = roster.members().iter().filter(|m| m.cost_imputed).collect();
        let mut names: Vec<&str> = imputed.iter().map(|m| m.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Fwd 5", "Mid 6"]);
        assert!(imputed.iter().all(|m| m.cost == default_cost));

        let recorded: f64 = roster
            .members()
            .iter()
            .filter(|m| !m.cost_imputed)
            .map(|m| m.cost)
            .sum();
        assert!((roster.total_cost() - (recorded + 2.0 * default_cost)).abs() < 1e-9);
    }
}

#[test]
fn optimal_roster_is_feasible_and_beats_random_rosters() {
    let pool = score(&table(), 3, &scorer_config()).unwrap();
    let budget = 75.0;

    let optimal = optimize(&pool, budget, &quotas()).unwrap();
    optimal.verify(&quotas(), budget).unwrap();
    assert_eq!(optimal.len(), 15);
    assert!(optimal.total_cost() <= budget + 1e-9);

    for seed in 0..10 {
        let config = SamplerConfig {
            seed: Some(seed),
            ..SamplerConfig::default()
        };
        let baseline = sample_random(&pool, budget, &quotas(), &config).unwrap();
        baseline.verify(&quotas(), budget).unwrap();
        let cmp = compare(&optimal, &baseline);
        assert!(cmp.value_gap >= -1e-9, "seed {seed}: gap {}", cmp.value_gap);
    }
}

#[test]
fn zero_budget_is_infeasible() {
    let pool = score(&table(), 3, &scorer_config()).unwrap();
    match optimize(&pool, 0.0, &quotas()) {
        Err(SelectionError::Infeasible(Infeasibility::OverBudget { minimum_cost, .. })) => {
            assert!(minimum_cost > 0.0);
        }
        other => panic!("expected OverBudget, got {other:?}"),
    }
}

#[test]
fn first_round_has_no_history() {
    assert!(matches!(
        score(&table(), 1, &scorer_config()),
        Err(SelectionError::InsufficientHistory { target_period: 1 })
    ));
}

#[test]
fn round_after_the_data_has_no_candidates() {
    assert!(matches!(
        score(&table(), 5, &scorer_config()),
        Err(SelectionError::NoCandidatesForPeriod { period: 4 })
    ));
}

#[test]
fn scoring_is_reproducible_for_a_fixed_seed() {
    let a = score(&table(), 3, &scorer_config()).unwrap();
    let b = score(&table(), 3, &scorer_config()).unwrap();
    assert_eq!(a.candidates, b.candidates);
}

#[test]
fn malformed_rows_are_reported_together() {
    let mut rows = raw_rows();
    rows[0].category = Some("Sweeper".into());
    rows[5].period = None;
    rows[9].features.remove("minutes");
    match CandidateTable::from_raw(&feature_names(), rows) {
        Err(SelectionError::MalformedCandidates(bad)) => {
            let ids: Vec<usize> = bad.iter().map(|m| m.row).collect();
            assert_eq!(ids, vec![0, 5, 9]);
        }
        other => panic!("expected MalformedCandidates, got {other:?}"),
    }
}
