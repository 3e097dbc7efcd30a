// Derived efficiency metrics computed from raw per-game counting stats.
//
// Several formulas are simplified approximations of the official statistics:
// rebound, assist and usage percentages use fixed league constants instead of
// team/opponent totals. Downstream weights and thresholds are tuned against
// these approximations, so the constants must stay as they are.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::boxscore::{BoxScore, BoxScoreTable, PlayerRecord, StatColumn};
use crate::config::MetricsConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Nominal league-average PER. Also the fallback for the impact rating.
pub const PER_BASELINE: f64 = 15.0;

/// Free-throw attempts are weighted by this factor when estimating shot
/// possessions.
const FTA_POSSESSION_FACTOR: f64 = 0.44;

/// Rebound rates are expressed per 36 minutes.
const PER_36: f64 = 36.0;
const OREB_DIVISOR: f64 = 10.0;
const DREB_DIVISOR: f64 = 30.0;
const TREB_DIVISOR: f64 = 40.0;

/// Assumed league-average assists per minute.
const LEAGUE_AST_RATE: f64 = 0.20;

const MINUTES_PER_GAME: f64 = 48.0;

// ---------------------------------------------------------------------------
// Metric identifiers
// ---------------------------------------------------------------------------

/// A derived metric. Keys (`efg_pct`, `ts_pct`, ...) are the column names used
/// in configuration and exported tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    EfgPct,
    TsPct,
    OrebPct,
    DrebPct,
    TrebPct,
    AstPct,
    TovPct,
    AstToRatio,
    UsgPct,
    GameScore,
    Per,
}

/// Per-player mapping of metric → value.
pub type MetricSet = BTreeMap<Metric, f64>;

const SHOOTING_INPUTS: &[StatColumn] = &[StatColumn::Fg, StatColumn::Fg3, StatColumn::Fga];
const TRUE_SHOOTING_INPUTS: &[StatColumn] = &[StatColumn::Pts, StatColumn::Fga, StatColumn::Fta];
const REBOUND_INPUTS: &[StatColumn] = &[
    StatColumn::Orb,
    StatColumn::Drb,
    StatColumn::Trb,
    StatColumn::Mp,
];
const ASSIST_INPUTS: &[StatColumn] = &[StatColumn::Ast, StatColumn::Mp];
const TURNOVER_INPUTS: &[StatColumn] = &[StatColumn::Tov, StatColumn::Fga, StatColumn::Fta];
const AST_TO_INPUTS: &[StatColumn] = &[StatColumn::Ast, StatColumn::Tov];
const USAGE_INPUTS: &[StatColumn] = &[
    StatColumn::Fga,
    StatColumn::Fta,
    StatColumn::Tov,
    StatColumn::Mp,
];
const GAME_SCORE_INPUTS: &[StatColumn] = &[
    StatColumn::Pts,
    StatColumn::Fg,
    StatColumn::Fga,
    StatColumn::Fta,
    StatColumn::Ft,
    StatColumn::Orb,
    StatColumn::Drb,
    StatColumn::Stl,
    StatColumn::Ast,
    StatColumn::Blk,
    StatColumn::Pf,
    StatColumn::Tov,
];
const PER_INPUTS: &[StatColumn] = &[
    StatColumn::Pts,
    StatColumn::Ast,
    StatColumn::Trb,
    StatColumn::Stl,
    StatColumn::Blk,
    StatColumn::Tov,
    StatColumn::Fg,
    StatColumn::Fga,
    StatColumn::Ft,
    StatColumn::Fta,
];

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::EfgPct,
        Metric::TsPct,
        Metric::OrebPct,
        Metric::DrebPct,
        Metric::TrebPct,
        Metric::AstPct,
        Metric::TovPct,
        Metric::AstToRatio,
        Metric::UsgPct,
        Metric::GameScore,
        Metric::Per,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::EfgPct => "efg_pct",
            Metric::TsPct => "ts_pct",
            Metric::OrebPct => "oreb_pct",
            Metric::DrebPct => "dreb_pct",
            Metric::TrebPct => "treb_pct",
            Metric::AstPct => "ast_pct",
            Metric::TovPct => "tov_pct",
            Metric::AstToRatio => "ast_to_ratio",
            Metric::UsgPct => "usg_pct",
            Metric::GameScore => "game_score",
            Metric::Per => "per",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Human-readable description for report generation.
    pub fn description(self) -> &'static str {
        match self {
            Metric::EfgPct => "Effective Field Goal Percentage - Accounts for 3-point shooting",
            Metric::TsPct => "True Shooting Percentage - Accounts for all shooting efficiency",
            Metric::OrebPct => {
                "Offensive Rebound Percentage - % of available offensive rebounds grabbed"
            }
            Metric::DrebPct => {
                "Defensive Rebound Percentage - % of available defensive rebounds grabbed"
            }
            Metric::TrebPct => "Total Rebound Percentage - % of available total rebounds grabbed",
            Metric::AstPct => {
                "Assist Percentage - % of teammate field goals assisted while on floor"
            }
            Metric::TovPct => "Turnover Percentage - Turnovers per 100 possessions",
            Metric::AstToRatio => "Assist-to-Turnover Ratio - Ball control efficiency",
            Metric::UsgPct => "Usage Percentage - % of team possessions used while on floor",
            Metric::GameScore => "Game Score - Overall statistical contribution in a game",
            Metric::Per => "Player Efficiency Rating - Overall player efficiency metric",
        }
    }

    /// Value used when inputs are missing or the formula is undefined.
    pub fn fallback(self) -> f64 {
        match self {
            Metric::Per => PER_BASELINE,
            _ => 0.0,
        }
    }

    /// Raw columns that must all be present for this metric to be computed.
    pub fn required_columns(self) -> &'static [StatColumn] {
        match self {
            Metric::EfgPct => SHOOTING_INPUTS,
            Metric::TsPct => TRUE_SHOOTING_INPUTS,
            Metric::OrebPct | Metric::DrebPct | Metric::TrebPct => REBOUND_INPUTS,
            Metric::AstPct => ASSIST_INPUTS,
            Metric::TovPct => TURNOVER_INPUTS,
            Metric::AstToRatio => AST_TO_INPUTS,
            Metric::UsgPct => USAGE_INPUTS,
            Metric::GameScore => GAME_SCORE_INPUTS,
            Metric::Per => PER_INPUTS,
        }
    }

    /// Apply the formula to one row. Never returns NaN or infinity: undefined
    /// results (zero attempts, zero minutes, zero turnovers) become the
    /// metric's fallback.
    pub fn compute(self, s: &BoxScore, config: &MetricsConfig) -> f64 {
        let raw = match self {
            Metric::EfgPct => effective_fg_pct(s),
            Metric::TsPct => true_shooting_pct(s),
            Metric::OrebPct => per_36(s.orb, s.mp) / OREB_DIVISOR,
            Metric::DrebPct => per_36(s.drb, s.mp) / DREB_DIVISOR,
            Metric::TrebPct => per_36(s.trb, s.mp) / TREB_DIVISOR,
            Metric::AstPct => (s.ast / s.mp) / LEAGUE_AST_RATE * 100.0,
            Metric::TovPct => s.tov / (shot_possessions(s) + s.tov) * 100.0,
            Metric::AstToRatio => s.ast / s.tov,
            Metric::UsgPct => usage_pct(s, config.league_pace),
            Metric::GameScore => game_score(s),
            Metric::Per => simplified_per(s),
        };
        finite_or(raw, self.fallback())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Metric key → description for every derived metric, in canonical order.
pub fn stat_descriptions() -> Vec<(&'static str, &'static str)> {
    Metric::ALL
        .into_iter()
        .map(|m| (m.key(), m.description()))
        .collect()
}

/// Resolve metric keys, silently dropping unknown ones and duplicates.
pub fn resolve_keys<S: AsRef<str>>(keys: &[S]) -> Vec<Metric> {
    let mut resolved = Vec::with_capacity(keys.len());
    for key in keys {
        match Metric::from_key(key.as_ref()) {
            Some(m) if !resolved.contains(&m) => resolved.push(m),
            Some(_) => {}
            None => debug!("ignoring unknown metric key '{}'", key.as_ref()),
        }
    }
    resolved
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn shot_possessions(s: &BoxScore) -> f64 {
    s.fga + FTA_POSSESSION_FACTOR * s.fta
}

fn per_36(count: f64, minutes: f64) -> f64 {
    count * (PER_36 / minutes)
}

/// `(FG + 0.5 * 3P) / FGA`
fn effective_fg_pct(s: &BoxScore) -> f64 {
    (s.fg + 0.5 * s.fg3) / s.fga
}

/// `PTS / (2 * (FGA + 0.44 * FTA))`
fn true_shooting_pct(s: &BoxScore) -> f64 {
    s.pts / (2.0 * shot_possessions(s))
}

/// `(FGA + 0.44 * FTA + TOV) * 100 / (MP * pace / 48)`
fn usage_pct(s: &BoxScore, league_pace: f64) -> f64 {
    (shot_possessions(s) + s.tov) * 100.0 / (s.mp * league_pace / MINUTES_PER_GAME)
}

fn game_score(s: &BoxScore) -> f64 {
    let scoring = s.pts + 0.4 * s.fg - 0.7 * s.fga - 0.4 * (s.fta - s.ft);
    let rebounding = 0.7 * s.orb + 0.3 * s.drb;
    let playmaking = s.stl + 0.7 * s.ast + 0.7 * s.blk;
    scoring + rebounding + playmaking - 0.4 * s.pf - s.tov
}

/// Box-score impact rating centred on `PER_BASELINE`. Not the official PER.
fn simplified_per(s: &BoxScore) -> f64 {
    let shooting = (s.fg - s.fga * 0.5) + (s.ft - s.fta * 0.5);
    let total = s.pts + 2.0 * s.ast + s.trb + 2.0 * s.stl + 2.0 * s.blk - s.tov + shooting;
    total / 10.0 + PER_BASELINE
}

// ---------------------------------------------------------------------------
// Column results
// ---------------------------------------------------------------------------

/// Whether a metric column was computed or filled with its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricStatus {
    Computed,
    /// Required raw columns were absent; every row holds the fallback.
    Defaulted { missing: Vec<StatColumn> },
}

/// One derived metric for every row of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub values: Vec<f64>,
    pub status: MetricStatus,
}

impl MetricColumn {
    pub fn computed(values: Vec<f64>) -> Self {
        MetricColumn {
            values,
            status: MetricStatus::Computed,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self.status, MetricStatus::Defaulted { .. })
    }
}

/// Compute one metric column over a table.
///
/// When a required raw column is missing the result is
/// `MetricStatus::Defaulted` with every row set to the fallback, so callers
/// can tell "computed zero" from "insufficient input".
pub fn compute_column(
    metric: Metric,
    table: &BoxScoreTable,
    config: &MetricsConfig,
) -> MetricColumn {
    let missing = table.missing_columns(metric.required_columns());
    if !missing.is_empty() {
        warn!(
            "missing required columns {:?} for {}; defaulting to {}",
            missing.iter().map(|c| c.key()).collect::<Vec<_>>(),
            metric,
            metric.fallback()
        );
        return MetricColumn {
            values: vec![metric.fallback(); table.len()],
            status: MetricStatus::Defaulted { missing },
        };
    }
    let values = table
        .records()
        .iter()
        .map(|r| metric.compute(&r.stats, config))
        .collect();
    MetricColumn::computed(values)
}

// ---------------------------------------------------------------------------
// Derived table
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("column {metric} has {actual} values but the table has {expected} rows")]
    ColumnLength {
        metric: Metric,
        expected: usize,
        actual: usize,
    },
}

/// Raw rows plus their derived metric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedTable {
    records: Vec<PlayerRecord>,
    columns: BTreeMap<Metric, MetricColumn>,
}

impl DerivedTable {
    /// Assemble a table from precomputed columns. Every column must hold one
    /// value per record.
    pub fn new(
        records: Vec<PlayerRecord>,
        columns: BTreeMap<Metric, MetricColumn>,
    ) -> Result<Self, TableError> {
        for (&metric, column) in &columns {
            if column.values.len() != records.len() {
                return Err(TableError::ColumnLength {
                    metric,
                    expected: records.len(),
                    actual: column.values.len(),
                });
            }
        }
        Ok(DerivedTable { records, columns })
    }

    pub fn records(&self) -> &[PlayerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column(&self, metric: Metric) -> Option<&MetricColumn> {
        self.columns.get(&metric)
    }

    /// Metrics present in this table, in canonical order.
    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.columns.keys().copied()
    }

    pub fn value(&self, row: usize, metric: Metric) -> Option<f64> {
        self.columns
            .get(&metric)
            .and_then(|c| c.values.get(row))
            .copied()
    }

    /// All metric values for one row.
    pub fn row_metrics(&self, row: usize) -> MetricSet {
        self.columns
            .iter()
            .filter_map(|(&m, c)| c.values.get(row).map(|&v| (m, v)))
            .collect()
    }

    /// Metrics that fell back to defaults, with the columns they lacked.
    pub fn defaulted(&self) -> Vec<(Metric, Vec<StatColumn>)> {
        self.columns
            .iter()
            .filter_map(|(&m, c)| match &c.status {
                MetricStatus::Defaulted { missing } => Some((m, missing.clone())),
                MetricStatus::Computed => None,
            })
            .collect()
    }

    /// Remove a metric column. Used to model partially derived tables.
    pub fn without_metric(mut self, metric: Metric) -> Self {
        self.columns.remove(&metric);
        self
    }
}

/// Compute every derived metric for every row.
///
/// An empty input yields an empty table immediately. Missing inputs never
/// abort: affected metrics are defaulted and logged.
pub fn derive_metrics(table: &BoxScoreTable, config: &MetricsConfig) -> DerivedTable {
    if table.is_empty() {
        warn!("empty box-score table provided; no metrics derived");
        return DerivedTable::default();
    }

    let columns: BTreeMap<Metric, MetricColumn> = Metric::ALL
        .into_iter()
        .map(|m| (m, compute_column(m, table, config)))
        .collect();

    let defaulted = columns.values().filter(|c| c.is_defaulted()).count();
    if defaulted > 0 {
        debug!("{} of {} metrics defaulted", defaulted, columns.len());
    }
    info!("calculated derived metrics for {} players", table.len());

    DerivedTable {
        records: table.records().to_vec(),
        columns,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
