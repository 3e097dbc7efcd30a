// Configuration loading and parsing (hoopgrade.toml).
//
// All model constants (pace, weight tables, tier thresholds, metric lists)
// live in one immutable `ModelConfig`, loaded once at startup and passed by
// reference into every pipeline stage.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metrics::Metric;
use crate::position::Position;

/// File name of the model configuration, under `config/` and `defaults/`.
pub const CONFIG_FILE_NAME: &str = "hoopgrade.toml";

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

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelConfig {
    pub metrics: MetricsConfig,
    pub normalization: NormalizationConfig,
    pub profile: ProfileConfig,
    pub tiers: TierThresholds,
    pub weights: WeightTable,
    pub cleaning: CleaningConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsConfig {
    /// Possessions per 48 minutes assumed for every team.
    pub league_pace: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig { league_pace: 100.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NormalizationConfig {
    /// Metric keys to min-max normalize, in output order.
    pub metrics: Vec<String>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        NormalizationConfig {
            metrics: [
                "efg_pct",
                "ts_pct",
                "ast_pct",
                "tov_pct",
                "usg_pct",
                "ast_to_ratio",
                "per",
                "treb_pct",
                "oreb_pct",
                "dreb_pct",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileConfig {
    /// Metric keys compared against the dataset mean.
    pub metrics: Vec<String>,
    /// Deviation from the mean, as a fraction of its magnitude, needed to
    /// count as a strength or weakness.
    pub deviation_fraction: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            metrics: ["efg_pct", "ts_pct", "ast_pct", "tov_pct", "usg_pct", "treb_pct"]
                .into_iter()
                .map(String::from)
                .collect(),
            deviation_fraction: 0.10,
        }
    }
}

/// Lower bounds (inclusive) of each tier. Anything below `bench_player` is
/// a Reserve.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TierThresholds {
    pub elite: f64,
    pub starter: f64,
    pub role_player: f64,
    pub bench_player: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        TierThresholds {
            elite: 0.85,
            starter: 0.70,
            role_player: 0.50,
            bench_player: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CleaningConfig {
    pub min_minutes: f64,
    pub min_games: u32,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        CleaningConfig {
            min_minutes: 10.0,
            min_games: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataPaths {
    pub input: String,
    pub output: String,
    pub summary: String,
    /// Ignore `input` and evaluate the built-in sample dataset.
    #[serde(default)]
    pub use_sample: bool,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            input: "data/raw/nba_player_data.csv".into(),
            output: "data/processed/nba_player_strength_evaluation.csv".into(),
            summary: "data/processed/model_summary.json".into(),
            use_sample: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Weight tables
// ---------------------------------------------------------------------------

/// Metric weights for one position, in canonical metric order.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionWeights {
    entries: Vec<(Metric, f64)>,
}

impl PositionWeights {
    pub fn new(pairs: &[(Metric, f64)]) -> Self {
        let mut map = BTreeMap::new();
        for &(metric, weight) in pairs {
            map.insert(metric, weight);
        }
        PositionWeights {
            entries: map.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.entries
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|&(_, w)| w)
    }

    /// Sum of all nominal weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Weight tables for all five positions.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    pub pg: PositionWeights,
    pub sg: PositionWeights,
    pub sf: PositionWeights,
    pub pf: PositionWeights,
    pub c: PositionWeights,
}

impl WeightTable {
    pub fn for_position(&self, position: Position) -> &PositionWeights {
        match position {
            Position::PG => &self.pg,
            Position::SG => &self.sg,
            Position::SF => &self.sf,
            Position::PF => &self.pf,
            Position::C => &self.c,
        }
    }

    /// Weights for a position label; unrecognised labels get the SF table.
    pub fn for_label(&self, label: &str) -> &PositionWeights {
        match Position::from_label(label) {
            Some(position) => self.for_position(position),
            None => &self.sf,
        }
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        use Metric::*;
        WeightTable {
            pg: PositionWeights::new(&[
                (EfgPct, 0.15),
                (TsPct, 0.15),
                (AstPct, 0.20),
                (TovPct, 0.10),
                (UsgPct, 0.10),
                (AstToRatio, 0.15),
                (Per, 0.15),
            ]),
            sg: PositionWeights::new(&[
                (EfgPct, 0.20),
                (TsPct, 0.20),
                (AstPct, 0.10),
                (TovPct, 0.10),
                (UsgPct, 0.15),
                (AstToRatio, 0.10),
                (Per, 0.15),
            ]),
            sf: PositionWeights::new(&[
                (EfgPct, 0.15),
                (TsPct, 0.15),
                (AstPct, 0.10),
                (TovPct, 0.10),
                (UsgPct, 0.15),
                (AstToRatio, 0.10),
                (Per, 0.15),
                (TrebPct, 0.10),
            ]),
            pf: PositionWeights::new(&[
                (EfgPct, 0.10),
                (TsPct, 0.10),
                (AstPct, 0.05),
                (TovPct, 0.10),
                (UsgPct, 0.10),
                (AstToRatio, 0.05),
                (Per, 0.15),
                (TrebPct, 0.25),
            ]),
            c: PositionWeights::new(&[
                (EfgPct, 0.10),
                (TsPct, 0.10),
                (AstPct, 0.05),
                (TovPct, 0.10),
                (UsgPct, 0.10),
                (AstToRatio, 0.05),
                (Per, 0.15),
                (TrebPct, 0.25),
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// hoopgrade.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire hoopgrade.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ModelFile {
    metrics: MetricsConfig,
    normalization: NormalizationConfig,
    profile: ProfileConfig,
    tiers: TierThresholds,
    weights: WeightsSection,
    cleaning: CleaningConfig,
    data_paths: DataPaths,
}

/// `[weights.PG]` ... `[weights.C]`, each a metric key → weight map.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
struct WeightsSection {
    PG: BTreeMap<String, f64>,
    SG: BTreeMap<String, f64>,
    SF: BTreeMap<String, f64>,
    PF: BTreeMap<String, f64>,
    C: BTreeMap<String, f64>,
}

fn resolve_weights(
    position: &str,
    raw: &BTreeMap<String, f64>,
) -> Result<PositionWeights, ConfigError> {
    let mut pairs = Vec::with_capacity(raw.len());
    for (key, &weight) in raw {
        let metric = Metric::from_key(key)
            .ok_or_else(|| invalid(format!("weights.{position}.{key}"), "unknown metric"))?;
        pairs.push((metric, weight));
    }
    Ok(PositionWeights::new(&pairs))
}

impl WeightsSection {
    fn resolve(&self) -> Result<WeightTable, ConfigError> {
        Ok(WeightTable {
            pg: resolve_weights("PG", &self.PG)?,
            sg: resolve_weights("SG", &self.SG)?,
            sf: resolve_weights("SF", &self.SF)?,
            pf: resolve_weights("PF", &self.PF)?,
            c: resolve_weights("C", &self.C)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Parse and validate a configuration from TOML text.
pub fn parse_config(text: &str, path: &Path) -> Result<ModelConfig, ConfigError> {
    let file: ModelFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = ModelConfig {
        metrics: file.metrics,
        normalization: file.normalization,
        profile: file.profile,
        tiers: file.tiers,
        weights: file.weights.resolve()?,
        cleaning: file.cleaning,
        data_paths: file.data_paths,
    };

    config.validate()?;
    Ok(config)
}

/// Load and validate `config/hoopgrade.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<ModelConfig, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<ModelConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl ModelConfig {
    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pace = self.metrics.league_pace;
        if !(pace.is_finite() && pace > 0.0) {
            return Err(invalid("metrics.league_pace", format!("must be > 0, got {pace}")));
        }

        // Tier thresholds must be finite and strictly descending
        let t = &self.tiers;
        let tiers: &[(&str, f64)] = &[
            ("tiers.elite", t.elite),
            ("tiers.starter", t.starter),
            ("tiers.role_player", t.role_player),
            ("tiers.bench_player", t.bench_player),
        ];
        for (name, val) in tiers {
            if !val.is_finite() {
                return Err(invalid(*name, format!("must be finite, got {val}")));
            }
        }
        for pair in tiers.windows(2) {
            let (upper_name, upper) = pair[0];
            let (lower_name, lower) = pair[1];
            if lower >= upper {
                return Err(invalid(
                    lower_name,
                    format!("must be below {upper_name} ({upper}), got {lower}"),
                ));
            }
        }

        // Weights must all be positive
        for position in Position::ALL {
            let table = self.weights.for_position(position);
            if table.is_empty() {
                return Err(invalid(format!("weights.{position}"), "must not be empty"));
            }
            for (metric, weight) in table.iter() {
                if !(weight.is_finite() && weight > 0.0) {
                    return Err(invalid(
                        format!("weights.{position}.{metric}"),
                        format!("must be > 0, got {weight}"),
                    ));
                }
            }
        }

        let frac = self.profile.deviation_fraction;
        if !(0.0..1.0).contains(&frac) {
            return Err(invalid(
                "profile.deviation_fraction",
                format!("must be in [0, 1), got {frac}"),
            ));
        }

        let min_minutes = self.cleaning.min_minutes;
        if !(min_minutes.is_finite() && min_minutes >= 0.0) {
            return Err(invalid(
                "cleaning.min_minutes",
                format!("must be >= 0, got {min_minutes}"),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        if !root.join("defaults").exists() {
            panic!("Cannot locate defaults/ directory from {:?}", root);
        }
        root
    }

    fn default_text() -> String {
        fs::read_to_string(project_root().join("defaults").join(CONFIG_FILE_NAME)).unwrap()
    }

    /// Write `text` as config/hoopgrade.toml under a fresh temp dir.
    fn temp_config(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE_NAME), text).unwrap();
        tmp
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn shipped_defaults_match_builtin_constants() {
        let config = parse_config(&default_text(), Path::new("defaults/hoopgrade.toml"))
            .expect("shipped defaults should parse");
        assert_eq!(config, ModelConfig::default());
    }

    #[test]
    fn builtin_defaults_validate() {
        ModelConfig::default().validate().expect("defaults should be valid");
    }

    #[test]
    fn weight_tables_carry_position_emphasis() {
        let weights = WeightTable::default();
        assert_eq!(weights.pg.get(Metric::AstPct), Some(0.20));
        assert_eq!(weights.pg.get(Metric::TrebPct), None);
        assert_eq!(weights.c.get(Metric::TrebPct), Some(0.25));
        assert_eq!(weights.pf.get(Metric::TrebPct), Some(0.25));
        assert!((weights.sf.total() - 1.0).abs() < 1e-9);
        assert!((weights.sg.total() - 1.0).abs() < 1e-9);
        assert!((weights.pg.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_label_falls_back_to_sf() {
        let weights = WeightTable::default();
        assert_eq!(weights.for_label("XX"), &weights.sf);
        assert_eq!(weights.for_label(""), &weights.sf);
        assert_eq!(weights.for_label("c"), &weights.c);
    }

    #[test]
    fn load_from_dir() {
        let tmp = temp_config("hoopgrade_config_load", &default_text());
        let config = load_config_from(&tmp).expect("should load");
        assert_eq!(config.metrics.league_pace, 100.0);
        assert_eq!(config.cleaning.min_games, 20);
        assert!(config.data_paths.use_sample);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_positive_pace() {
        let text = default_text().replace("league_pace = 100.0", "league_pace = 0.0");
        let err = parse_config(&text, Path::new("x.toml")).unwrap_err();
        expect_validation_field(err, "metrics.league_pace");
    }

    #[test]
    fn rejects_non_descending_tiers() {
        let text = default_text().replace("role_player = 0.50", "role_player = 0.75");
        let err = parse_config(&text, Path::new("x.toml")).unwrap_err();
        expect_validation_field(err, "tiers.role_player");
    }

    #[test]
    fn rejects_unknown_weight_metric() {
        let text = default_text().replace("[weights.C]\n", "[weights.C]\nwingspan = 0.1\n");
        let err = parse_config(&text, Path::new("x.toml")).unwrap_err();
        expect_validation_field(err, "weights.C.wingspan");
    }

    #[test]
    fn rejects_zero_weight() {
        let mut config = ModelConfig::default();
        config.weights.sg = PositionWeights::new(&[(Metric::EfgPct, 0.0), (Metric::Per, 1.0)]);
        expect_validation_field(config.validate().unwrap_err(), "weights.SG.efg_pct");
    }

    #[test]
    fn rejects_deviation_fraction_out_of_range() {
        let mut config = ModelConfig::default();
        config.profile.deviation_fraction = 1.5;
        expect_validation_field(config.validate().unwrap_err(), "profile.deviation_fraction");
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("hoopgrade_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config("hoopgrade_config_invalid", "this is not valid [[[ toml");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("hoopgrade_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join(CONFIG_FILE_NAME), default_text()).unwrap();
        fs::write(defaults_dir.join("local.toml.example"), "# example\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config").join(CONFIG_FILE_NAME).exists());
        assert!(!tmp.join("config/local.toml.example").exists());

        // Second run leaves the existing file alone
        fs::write(tmp.join("config").join(CONFIG_FILE_NAME), "# custom\n").unwrap();
        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("hoopgrade_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
