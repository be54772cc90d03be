// Candidate table: validated per-period player observations.
//
// Rows arrive from an external loader as `RawCandidate`s with every field
// optional. Validation happens once, up front, and reports every offending
// row so a bad dataset can be fixed in one pass.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::category::Category;
use crate::error::{MalformedCandidate, MalformedReason, SelectionError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// An unvalidated input row. Missing cells are `None` / absent map keys.
#[derive(Debug, Clone, Default)]
pub struct RawCandidate {
    pub name: String,
    pub team: String,
    pub period: Option<u32>,
    pub category: Option<String>,
    pub cost: Option<f64>,
    pub features: HashMap<String, f64>,
    pub observed_value: Option<f64>,
}

/// One validated observation of a player in a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    /// Row index in the input table.
    pub id: usize,
    pub name: String,
    pub team: String,
    pub period: u32,
    pub category: Category,
    /// Missing costs stay `None` here; the scorer imputes them.
    pub cost: Option<f64>,
    /// Ordered like `CandidateTable::feature_names`.
    pub features: Vec<f64>,
    pub observed_value: Option<f64>,
}

/// Read-only, validated dataset.
#[derive(Debug, Clone)]
pub struct CandidateTable {
    feature_names: Vec<String>,
    records: Vec<CandidateRecord>,
}

// ---------------------------------------------------------------------------
// Construction and validation
// ---------------------------------------------------------------------------

impl CandidateTable {
    /// Validate raw rows against the configured feature list.
    ///
    /// Fails with `MalformedCandidates` listing every bad row, or with
    /// `InvalidRequest` when the feature list itself is unusable.
    pub fn from_raw(
        feature_names: &[String],
        rows: Vec<RawCandidate>,
    ) -> Result<Self, SelectionError> {
        if feature_names.is_empty() {
            return Err(SelectionError::InvalidRequest(
                "at least one prediction feature is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for name in feature_names {
            if !seen.insert(name.as_str()) {
                return Err(SelectionError::InvalidRequest(format!(
                    "feature '{name}' listed twice"
                )));
            }
        }

        let mut records = Vec::with_capacity(rows.len());
        let mut malformed = Vec::new();

        for (row, raw) in rows.into_iter().enumerate() {
            match validate_row(row, raw, feature_names) {
                Ok(record) => records.push(record),
                Err(bad) => malformed.push(bad),
            }
        }

        if !malformed.is_empty() {
            return Err(SelectionError::MalformedCandidates(malformed));
        }

        Ok(CandidateTable {
            feature_names: feature_names.to_vec(),
            records,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct periods present in the table, ascending.
    pub fn periods(&self) -> BTreeSet<u32> {
        self.records.iter().map(|r| r.period).collect()
    }

    /// Column index of a feature, if configured.
    pub fn feature_index(&self, feature: &str) -> Option<usize> {
        self.feature_names.iter().position(|f| f == feature)
    }
}

fn validate_row(
    row: usize,
    raw: RawCandidate,
    feature_names: &[String],
) -> Result<CandidateRecord, MalformedCandidate> {
    let reject = |reason| MalformedCandidate {
        row,
        name: raw.name.clone(),
        reason,
    };

    let period = raw.period.ok_or_else(|| reject(MalformedReason::MissingPeriod))?;

    let category = match raw.category.as_deref() {
        None => return Err(reject(MalformedReason::MissingCategory)),
        Some(s) if s.trim().is_empty() => return Err(reject(MalformedReason::MissingCategory)),
        Some(s) => Category::from_str_pos(s)
            .ok_or_else(|| reject(MalformedReason::UnknownCategory(s.trim().to_string())))?,
    };

    if let Some(cost) = raw.cost {
        if !cost.is_finite() {
            return Err(reject(MalformedReason::NonFiniteCost));
        }
        if cost < 0.0 {
            return Err(reject(MalformedReason::NegativeCost(cost)));
        }
    }

    let mut features = Vec::with_capacity(feature_names.len());
    for name in feature_names {
        match raw.features.get(name) {
            None => return Err(reject(MalformedReason::MissingFeature(name.clone()))),
            Some(v) if !v.is_finite() => {
                return Err(reject(MalformedReason::NonFiniteFeature(name.clone())))
            }
            Some(&v) => features.push(v),
        }
    }

    if raw.observed_value.is_some_and(|v| !v.is_finite()) {
        return Err(reject(MalformedReason::NonFiniteObservedValue));
    }

    Ok(CandidateRecord {
        id: row,
        name: raw.name.trim().to_string(),
        team: raw.team.trim().to_string(),
        period,
        category,
        cost: raw.cost,
        features,
        observed_value: raw.observed_value,
    })
}

// ---------------------------------------------------------------------------
// Read-only queries
// ---------------------------------------------------------------------------

impl CandidateTable {
    /// Top `n` players of a period by the summed value of one feature
    /// (e.g. goals or assists). Ties are ordered by name.
    pub fn leaders(
        &self,
        period: u32,
        feature: &str,
        n: usize,
    ) -> Result<Vec<(String, f64)>, SelectionError> {
        let idx = self.feature_index(feature).ok_or_else(|| {
            SelectionError::InvalidRequest(format!("'{feature}' is not a configured feature"))
        })?;

        let mut totals: HashMap<&str, f64> = HashMap::new();
        for record in self.records.iter().filter(|r| r.period == period) {
            *totals.entry(record.name.as_str()).or_insert(0.0) += record.features[idx];
        }

        let mut ranked: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(name, total)| (name.to_string(), total))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Distinct player names of a club (case-insensitive match), in table order.
    pub fn team_roster(&self, team: &str) -> Vec<String> {
        let wanted = team.trim().to_lowercase();
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| r.team.to_lowercase() == wanted)
            .filter(|r| seen.insert(r.name.as_str()))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Whether a player with exactly this name appears anywhere in the table.
    pub fn contains_player(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> Vec<String> {
        vec!["goals".into(), "assists".into()]
    }

    fn raw(name: &str, team: &str, period: u32, cat: &str, goals: f64, assists: f64) -> RawCandidate {
        let mut f = HashMap::new();
        f.insert("goals".to_string(), goals);
        f.insert("assists".to_string(), assists);
        RawCandidate {
            name: name.into(),
            team: team.into(),
            period: Some(period),
            category: Some(cat.into()),
            cost: Some(6.0),
            features: f,
            observed_value: Some(4.0),
        }
    }

    #[test]
    fn valid_rows_keep_order_and_row_ids() {
        let rows = vec![
            raw("Salah", "Liverpool", 1, "MID", 1.0, 0.0),
            raw("Kane", "Bayern", 1, "FWD", 2.0, 1.0),
        ];
        let table = CandidateTable::from_raw(&features(), rows).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].id, 1);
        assert_eq!(table.records()[1].category, Category::Forward);
        assert_eq!(table.records()[1].features, vec![2.0, 1.0]);
    }

    #[test]
    fn missing_cost_is_kept_as_none() {
        let mut row = raw("Saka", "Arsenal", 1, "MID", 0.0, 1.0);
        row.cost = None;
        let table = CandidateTable::from_raw(&features(), vec![row]).unwrap();
        assert_eq!(table.records()[0].cost, None);
    }

    #[test]
    fn every_malformed_row_is_reported() {
        let mut negative = raw("A", "X", 1, "GK", 0.0, 0.0);
        negative.cost = Some(-2.0);
        let unknown = raw("B", "X", 1, "SWEEPER", 0.0, 0.0);
        let mut missing = raw("C", "X", 1, "DEF", 0.0, 0.0);
        missing.features.remove("assists");
        let good = raw("D", "X", 1, "DEF", 0.0, 0.0);

        let err = CandidateTable::from_raw(&features(), vec![negative, good, unknown, missing])
            .unwrap_err();
        let SelectionError::MalformedCandidates(rows) = err else {
            panic!("expected MalformedCandidates, got {err:?}");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].row, 0);
        assert_eq!(rows[0].reason, MalformedReason::NegativeCost(-2.0));
        assert_eq!(rows[1].row, 2);
        assert_eq!(rows[1].reason, MalformedReason::UnknownCategory("SWEEPER".into()));
        assert_eq!(rows[2].row, 3);
        assert_eq!(rows[2].reason, MalformedReason::MissingFeature("assists".into()));
    }

    #[test]
    fn missing_period_and_category_are_malformed() {
        let mut no_period = raw("A", "X", 1, "GK", 0.0, 0.0);
        no_period.period = None;
        let mut no_cat = raw("B", "X", 1, "GK", 0.0, 0.0);
        no_cat.category = Some("  ".into());
        let err = CandidateTable::from_raw(&features(), vec![no_period, no_cat]).unwrap_err();
        let SelectionError::MalformedCandidates(rows) = err else {
            panic!("expected MalformedCandidates");
        };
        assert_eq!(rows[0].reason, MalformedReason::MissingPeriod);
        assert_eq!(rows[1].reason, MalformedReason::MissingCategory);
    }

    #[test]
    fn nan_feature_and_observed_value_are_malformed() {
        let mut nan_feature = raw("A", "X", 1, "GK", f64::NAN, 0.0);
        nan_feature.observed_value = Some(1.0);
        let mut nan_points = raw("B", "X", 1, "GK", 0.0, 0.0);
        nan_points.observed_value = Some(f64::INFINITY);
        let err = CandidateTable::from_raw(&features(), vec![nan_feature, nan_points]).unwrap_err();
        let SelectionError::MalformedCandidates(rows) = err else {
            panic!("expected MalformedCandidates");
        };
        assert_eq!(rows[0].reason, MalformedReason::NonFiniteFeature("goals".into()));
        assert_eq!(rows[1].reason, MalformedReason::NonFiniteObservedValue);
    }

    #[test]
    fn empty_or_duplicate_feature_list_is_rejected() {
        assert!(matches!(
            CandidateTable::from_raw(&[], vec![]),
            Err(SelectionError::InvalidRequest(_))
        ));
        let dup = vec!["goals".to_string(), "goals".to_string()];
        assert!(matches!(
            CandidateTable::from_raw(&dup, vec![]),
            Err(SelectionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn leaders_sum_per_player_within_period() {
        let rows = vec![
            raw("Kane", "Bayern", 2, "FWD", 2.0, 0.0),
            raw("Haaland", "City", 2, "FWD", 1.0, 0.0),
            raw("Haaland", "City", 2, "FWD", 2.0, 0.0),
            raw("Mbappe", "Real", 1, "FWD", 5.0, 0.0),
            raw("Vinicius", "Real", 2, "FWD", 2.0, 3.0),
        ];
        let table = CandidateTable::from_raw(&features(), rows).unwrap();
        let top = table.leaders(2, "goals", 2).unwrap();
        assert_eq!(top, vec![("Haaland".to_string(), 3.0), ("Kane".to_string(), 2.0)]);

        let assists = table.leaders(2, "assists", 1).unwrap();
        assert_eq!(assists[0].0, "Vinicius");

        assert!(table.leaders(2, "tackles", 3).is_err());
    }

    #[test]
    fn team_roster_is_case_insensitive_and_distinct() {
        let rows = vec![
            raw("Saka", "Arsenal", 1, "MID", 0.0, 0.0),
            raw("Saka", "Arsenal", 2, "MID", 0.0, 0.0),
            raw("Rice", "arsenal", 2, "MID", 0.0, 0.0),
            raw("Palmer", "Chelsea", 2, "MID", 0.0, 0.0),
        ];
        let table = CandidateTable::from_raw(&features(), rows).unwrap();
        assert_eq!(table.team_roster("ARSENAL"), vec!["Saka", "Rice"]);
        assert!(table.team_roster("Spurs").is_empty());
        assert!(table.contains_player("Palmer"));
        assert!(!table.contains_player("palmer"));
    }
}
