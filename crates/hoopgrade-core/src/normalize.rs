// Cross-sectional min-max normalization.
//
// Two passes: `Normalizer::fit` computes per-metric bounds over the whole
// table, `Normalizer::apply` maps every row. Bounds depend on the full
// population, so changing any row requires refitting.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::metrics::{resolve_keys, DerivedTable, Metric, MetricSet};

/// Suffix appended to a metric key to name its normalized column.
pub const NORM_SUFFIX: &str = "_norm";

/// Value assigned to every row when a metric is constant across the table.
pub const DEGENERATE_VALUE: f64 = 0.5;

/// Column name for the normalized form of `metric` (e.g. `ts_pct_norm`).
pub fn normalized_column_name(metric: Metric) -> String {
    format!("{}{}", metric.key(), NORM_SUFFIX)
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Observed range of a metric across the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxBounds {
    pub min: f64,
    pub max: f64,
}

impl MinMaxBounds {
    /// Bounds of a slice. `None` for an empty slice.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let (&first, rest) = values.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(MinMaxBounds { min, max })
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// `(value - min) / (max - min)`, or `DEGENERATE_VALUE` when the range is
    /// empty.
    pub fn apply(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return DEGENERATE_VALUE;
        }
        (value - self.min) / (self.max - self.min)
    }

    /// Inverse of `apply` for non-degenerate bounds.
    pub fn rescale(&self, normalized: f64) -> f64 {
        self.min + normalized * (self.max - self.min)
    }
}

// ---------------------------------------------------------------------------
// Fit / apply
// ---------------------------------------------------------------------------

/// Per-metric bounds fitted on one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalizer {
    bounds: BTreeMap<Metric, MinMaxBounds>,
}

impl Normalizer {
    /// Fit bounds for each requested metric that the table actually holds.
    /// Absent metrics are skipped silently.
    pub fn fit(table: &DerivedTable, metrics: &[Metric]) -> Self {
        let mut bounds = BTreeMap::new();
        for &metric in metrics {
            let Some(column) = table.column(metric) else {
                debug!("skipping normalization of absent metric {}", metric);
                continue;
            };
            if let Some(b) = MinMaxBounds::fit(&column.values) {
                if b.is_degenerate() {
                    warn!(
                        "{} is constant ({}); normalizing to {}",
                        metric, b.min, DEGENERATE_VALUE
                    );
                }
                bounds.insert(metric, b);
            }
        }
        Normalizer { bounds }
    }

    pub fn bounds(&self, metric: Metric) -> Option<&MinMaxBounds> {
        self.bounds.get(&metric)
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.bounds.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Map every row of `table` through the fitted bounds.
    pub fn apply(&self, table: &DerivedTable) -> NormalizedTable {
        let columns = self
            .bounds
            .iter()
            .filter_map(|(&metric, bounds)| {
                let column = table.column(metric)?;
                let values = column.values.iter().map(|&v| bounds.apply(v)).collect();
                Some((metric, values))
            })
            .collect();
        NormalizedTable {
            rows: table.len(),
            columns,
        }
    }
}

/// Normalized metric columns, one value per row of the source table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    rows: usize,
    columns: BTreeMap<Metric, Vec<f64>>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, metric: Metric) -> Option<&[f64]> {
        self.columns.get(&metric).map(Vec::as_slice)
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.columns.keys().copied()
    }

    pub fn value(&self, row: usize, metric: Metric) -> Option<f64> {
        self.columns.get(&metric).and_then(|c| c.get(row)).copied()
    }

    /// All normalized values for one row.
    pub fn row(&self, row: usize) -> MetricSet {
        self.columns
            .iter()
            .filter_map(|(&m, c)| c.get(row).map(|&v| (m, v)))
            .collect()
    }
}

/// Normalize the configured metric keys present in `table`.
///
/// Unknown or absent metrics are skipped. When none are available a warning
/// is logged and the result has no columns.
pub fn normalize<S: AsRef<str>>(table: &DerivedTable, metric_keys: &[S]) -> NormalizedTable {
    if table.is_empty() {
        warn!("empty table provided for normalization");
        return NormalizedTable::default();
    }
    let metrics = resolve_keys(metric_keys);
    let normalizer = Normalizer::fit(table, &metrics);
    if normalizer.is_empty() {
        warn!("no statistics available for normalization");
        return NormalizedTable {
            rows: table.len(),
            columns: BTreeMap::new(),
        };
    }
    normalizer.apply(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
