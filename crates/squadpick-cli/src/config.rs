// Configuration loading and parsing (config/squadpick.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use squadpick_core::forest::ForestParams;
use squadpick_core::{Quotas, SamplerConfig, ScorerConfig};

const CONFIG_FILE: &str = "squadpick.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub selection: SelectionConfig,
    pub baseline: BaselineConfig,
    pub runtime: RuntimeConfig,
    /// Parsed `selection.quotas`.
    pub quotas: Quotas,
    /// Parsed `selection.lineup`: how many of each category start.
    pub lineup: Quotas,
    /// Directory the config was loaded from; relative dataset paths resolve
    /// against it.
    pub base_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// squadpick.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    dataset: DatasetConfig,
    model: ModelConfig,
    selection: SelectionConfig,
    baseline: BaselineConfig,
    runtime: RuntimeConfig,
}

/// Where the per-round dataset lives and which columns hold what.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
    pub name_column: String,
    pub team_column: String,
    pub category_column: String,
    pub period_column: String,
    pub cost_column: String,
    pub target_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub features: Vec<String>,
    pub n_trees: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    #[serde(default)]
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    pub budget: f64,
    pub default_cost: f64,
    pub quotas: HashMap<String, usize>,
    pub lineup: HashMap<String, usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineConfig {
    pub max_attempts: usize,
    /// Fixed seed for random squads; omitted means a fresh squad every run.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    pub request_timeout_secs: u64,
}

// ---------------------------------------------------------------------------
// Conversions into core parameters
// ---------------------------------------------------------------------------

impl Config {
    pub fn dataset_path(&self) -> PathBuf {
        let path = Path::new(&self.dataset.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            default_cost: self.selection.default_cost,
            forest: ForestParams {
                n_trees: self.model.n_trees,
                max_depth: self.model.max_depth,
                min_samples_split: self.model.min_samples_split,
                min_samples_leaf: self.model.min_samples_leaf,
                max_features: self.model.max_features,
                bootstrap: self.model.bootstrap,
                seed: self.model.seed,
            },
        }
    }

    /// Sampler settings; a command-line seed wins over the configured one.
    pub fn sampler_config(&self, seed_override: Option<u64>) -> SamplerConfig {
        SamplerConfig {
            max_attempts: self.baseline.max_attempts,
            seed: seed_override.or(self.baseline.seed),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/squadpick.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let quotas = Quotas::from_config(&file.selection.quotas)
        .map_err(|e| invalid("selection.quotas", e.to_string()))?;
    let lineup = Quotas::from_config(&file.selection.lineup)
        .map_err(|e| invalid("selection.lineup", e.to_string()))?;

    let config = Config {
        dataset: file.dataset,
        model: file.model,
        selection: file.selection,
        baseline: file.baseline,
        runtime: file.runtime,
        quotas,
        lineup,
        base_dir: base_dir.to_path_buf(),
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/squadpick.toml` from `defaults/` on first run.
///
/// Returns the path written, or `None` when a config already exists. An
/// existing config is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{CONFIG_FILE} or defaults/{CONFIG_FILE} in {}; \
                 pass --config-dir or run from the project root",
                base_dir.display()
            ),
        });
    }

    let copy_error = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to seed {}: {e}", target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_error)?;
    std::fs::copy(&source, &target).map_err(copy_error)?;
    Ok(Some(target))
}

/// Seed the config from defaults if needed, then load it.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let d = &config.dataset;
    if d.path.trim().is_empty() {
        return Err(invalid("dataset.path", "must not be empty"));
    }
    let columns: &[(&str, &str)] = &[
        ("dataset.name_column", d.name_column.as_str()),
        ("dataset.team_column", d.team_column.as_str()),
        ("dataset.category_column", d.category_column.as_str()),
        ("dataset.period_column", d.period_column.as_str()),
        ("dataset.cost_column", d.cost_column.as_str()),
        ("dataset.target_column", d.target_column.as_str()),
    ];
    for (field, column) in columns {
        if column.trim().is_empty() {
            return Err(invalid(field, "must not be empty"));
        }
    }

    // Model
    let m = &config.model;
    if m.features.is_empty() {
        return Err(invalid("model.features", "must list at least one feature"));
    }
    for (i, feature) in m.features.iter().enumerate() {
        if m.features[..i].contains(feature) {
            return Err(invalid(
                "model.features",
                format!("'{feature}' is listed twice"),
            ));
        }
        if feature == &d.target_column {
            return Err(invalid(
                "model.features",
                format!("'{feature}' is the target column"),
            ));
        }
    }
    if m.n_trees == 0 {
        return Err(invalid("model.n_trees", "must be > 0"));
    }
    if m.min_samples_split < 2 {
        return Err(invalid(
            "model.min_samples_split",
            format!("must be >= 2, got {}", m.min_samples_split),
        ));
    }
    if m.min_samples_leaf == 0 {
        return Err(invalid("model.min_samples_leaf", "must be > 0"));
    }
    if let Some(k) = m.max_features {
        if k == 0 || k > m.features.len() {
            return Err(invalid(
                "model.max_features",
                format!("must be between 1 and {}, got {k}", m.features.len()),
            ));
        }
    }

    // Selection
    let s = &config.selection;
    if !s.budget.is_finite() || s.budget < 0.0 {
        return Err(invalid(
            "selection.budget",
            format!("must be a non-negative number, got {}", s.budget),
        ));
    }
    if !s.default_cost.is_finite() || s.default_cost < 0.0 {
        return Err(invalid(
            "selection.default_cost",
            format!("must be a non-negative number, got {}", s.default_cost),
        ));
    }
    if config.quotas.total() == 0 {
        return Err(invalid("selection.quotas", "must require at least one player"));
    }
    for (category, starting) in config.lineup.iter() {
        let squad = config.quotas.get(category);
        if starting > squad {
            return Err(invalid(
                "selection.lineup",
                format!("{category} starts {starting} but the squad only has {squad}"),
            ));
        }
    }

    if config.baseline.max_attempts == 0 {
        return Err(invalid("baseline.max_attempts", "must be > 0"));
    }
    if config.runtime.request_timeout_secs == 0 {
        return Err(invalid("runtime.request_timeout_secs", "must be > 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use squadpick_core::Category;
    use std::fs;

    /// Helper: returns the squadpick-cli crate root, which holds `defaults/`.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Fresh temp dir with the default config copied into `config/`.
    fn temp_config_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("config").join(CONFIG_FILE),
        )
        .unwrap();
        tmp
    }

    /// Rewrite the temp config with a textual substitution.
    fn patch_config(dir: &Path, from: &str, to: &str) {
        let path = dir.join("config").join(CONFIG_FILE);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "default config lacks '{from}'");
        fs::write(&path, text.replacen(from, to, 1)).unwrap();
    }

    fn expect_field_error(dir: &Path, field: &str) {
        match load_config_from(dir) {
            Err(ConfigError::ValidationError { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected validation error on {field}, got {other:?}"),
        }
    }

    #[test]
    fn load_defaults() {
        let tmp = temp_config_dir("squadpick_config_defaults");
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.dataset.name_column, "player_name");
        assert_eq!(config.dataset.category_column, "position");
        assert_eq!(config.dataset.period_column, "round");
        assert_eq!(config.dataset.target_column, "fantasy_points");
        assert_eq!(
            config.model.features,
            vec!["goals", "assists", "shots", "tackles", "minutes"]
        );
        assert_eq!(config.model.n_trees, 100);
        assert_eq!(config.model.seed, 42);
        assert!(config.model.bootstrap);
        assert!(config.model.max_depth.is_none());
        assert!((config.selection.budget - 100.0).abs() < f64::EPSILON);
        assert!((config.selection.default_cost - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.quotas.get(Category::Goalkeeper), 2);
        assert_eq!(config.quotas.get(Category::Midfielder), 5);
        assert_eq!(config.quotas.total(), 15);
        assert_eq!(config.lineup.total(), 11);
        assert_eq!(config.baseline.max_attempts, 1000);
        assert!(config.baseline.seed.is_none());
        assert_eq!(config.dataset_path(), tmp.join("data/player_rounds.csv"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_seeds_once_then_keeps_edits() {
        let tmp = std::env::temp_dir().join("squadpick_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("defaults").join(CONFIG_FILE),
        )
        .unwrap();

        let seeded = ensure_config_file(&tmp).unwrap();
        assert_eq!(seeded, Some(tmp.join("config").join(CONFIG_FILE)));

        patch_config(&tmp, "budget = 100.0", "budget = 80.0");
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let config = load_config(&tmp).unwrap();
        assert!((config.selection.budget - 80.0).abs() < f64::EPSILON);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_directories_are_reported() {
        let tmp = std::env::temp_dir().join("squadpick_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_file(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::FileNotFound { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let tmp = temp_config_dir("squadpick_config_parse");
        patch_config(&tmp, "n_trees = 100", "n_trees = \"many\"");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_budget() {
        let tmp = temp_config_dir("squadpick_config_budget");
        patch_config(&tmp, "budget = 100.0", "budget = -1.0");
        expect_field_error(&tmp, "selection.budget");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_quota_key() {
        let tmp = temp_config_dir("squadpick_config_quota_key");
        patch_config(&tmp, "FWD = 4", "WING = 4");
        expect_field_error(&tmp, "selection.quotas");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_lineup_larger_than_squad() {
        let tmp = temp_config_dir("squadpick_config_lineup");
        patch_config(&tmp, "GK = 1", "GK = 3");
        expect_field_error(&tmp, "selection.lineup");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_trees() {
        let tmp = temp_config_dir("squadpick_config_trees");
        patch_config(&tmp, "n_trees = 100", "n_trees = 0");
        expect_field_error(&tmp, "model.n_trees");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_target_as_feature() {
        let tmp = temp_config_dir("squadpick_config_target_feature");
        patch_config(&tmp, "\"minutes\"]", "\"minutes\", \"fantasy_points\"]");
        expect_field_error(&tmp, "model.features");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn cli_seed_overrides_configured_seed() {
        let tmp = temp_config_dir("squadpick_config_seed");
        patch_config(&tmp, "# seed = 7", "seed = 7");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.sampler_config(None).seed, Some(7));
        assert_eq!(config.sampler_config(Some(3)).seed, Some(3));
        let _ = fs::remove_dir_all(&tmp);
    }
}
