// Per-round dataset loading.
//
// Reads a header-driven CSV whose column names come from `[dataset]` in the
// config. Cells that are empty or fail to parse become missing values so the
// candidate table can report every bad row at once.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use squadpick_core::{CandidateTable, RawCandidate, SelectionError};

use crate::config::DatasetConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("required column '{column}' not found in dataset header")]
    MissingColumn { column: String },

    #[error(transparent)]
    Table(#[from] SelectionError),
}

/// Failures of the reader-based loader, before a path is attached.
#[derive(Debug)]
enum ReadError {
    Csv(csv::Error),
    MissingColumn(String),
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

struct Columns {
    name: usize,
    team: Option<usize>,
    category: usize,
    period: usize,
    cost: Option<usize>,
    target: Option<usize>,
    features: Vec<(String, usize)>,
}

impl Columns {
    fn locate(
        headers: &csv::StringRecord,
        dataset: &DatasetConfig,
        features: &[String],
    ) -> Result<Self, ReadError> {
        let find = |column: &str| headers.iter().position(|h| h.trim() == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| ReadError::MissingColumn(column.to_string()))
        };

        let team = find(&dataset.team_column);
        if team.is_none() {
            warn!("dataset has no '{}' column; clubs will be blank", dataset.team_column);
        }
        let cost = find(&dataset.cost_column);
        if cost.is_none() {
            warn!("dataset has no '{}' column; every cost will be imputed", dataset.cost_column);
        }
        let target = find(&dataset.target_column);
        if target.is_none() {
            warn!("dataset has no '{}' column; nothing to train on", dataset.target_column);
        }

        let features = features
            .iter()
            .map(|f| require(f).map(|idx| (f.clone(), idx)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Columns {
            name: require(&dataset.name_column)?,
            team,
            category: require(&dataset.category_column)?,
            period: require(&dataset.period_column)?,
            cost,
            target,
            features,
        })
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

fn cell<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse a numeric cell; unparsable text is logged and treated as missing.
fn number(
    record: &csv::StringRecord,
    idx: Option<usize>,
    line: usize,
    column: &str,
) -> Option<f64> {
    let text = cell(record, idx)?;
    match text.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("line {line}: unparsable {column} '{text}', treating as missing");
            None
        }
    }
}

/// Rounds are whole numbers, though exports sometimes write them as `3.0`.
fn round_number(
    record: &csv::StringRecord,
    idx: usize,
    line: usize,
    column: &str,
) -> Option<u32> {
    let text = cell(record, Some(idx))?;
    if let Ok(v) = text.parse::<u32>() {
        return Some(v);
    }
    match text.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Some(v as u32),
        _ => {
            warn!("line {line}: unparsable {column} '{text}', treating as missing");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_rows_from_reader<R: Read>(
    rdr: R,
    dataset: &DatasetConfig,
    features: &[String],
) -> Result<Vec<RawCandidate>, ReadError> {
    // Short rows are kept; their absent cells read as missing values.
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers().map_err(ReadError::Csv)?.clone();
    let columns = Columns::locate(&headers, dataset, features)?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let record = result.map_err(ReadError::Csv)?;
        if record.len() < headers.len() {
            warn!(
                "line {line}: {} of {} cells present",
                record.len(),
                headers.len()
            );
        }

        let mut row_features = HashMap::with_capacity(columns.features.len());
        for (name, idx) in &columns.features {
            if let Some(v) = number(&record, Some(*idx), line, name) {
                row_features.insert(name.clone(), v);
            }
        }

        rows.push(RawCandidate {
            name: cell(&record, Some(columns.name)).unwrap_or_default().to_string(),
            team: cell(&record, columns.team).unwrap_or_default().to_string(),
            period: round_number(&record, columns.period, line, &dataset.period_column),
            category: cell(&record, Some(columns.category)).map(str::to_string),
            cost: number(&record, columns.cost, line, &dataset.cost_column),
            features: row_features,
            observed_value: number(&record, columns.target, line, &dataset.target_column),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Read raw rows from a CSV file.
pub fn load_rows(
    path: &Path,
    dataset: &DatasetConfig,
    features: &[String],
) -> Result<Vec<RawCandidate>, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_rows_from_reader(file, dataset, features).map_err(|e| match e {
        ReadError::Csv(source) => DataError::Csv {
            path: path.display().to_string(),
            source,
        },
        ReadError::MissingColumn(column) => DataError::MissingColumn { column },
    })
}

/// Read and validate the dataset into a candidate table.
pub fn load_table(
    path: &Path,
    dataset: &DatasetConfig,
    features: &[String],
) -> Result<CandidateTable, DataError> {
    let rows = load_rows(path, dataset, features)?;
    let table = CandidateTable::from_raw(features, rows)?;
    info!(
        "Loaded {} rows covering rounds {:?} from {}",
        table.len(),
        table.periods(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
