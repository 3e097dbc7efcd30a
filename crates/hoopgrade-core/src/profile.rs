// Strength / weakness profiling against dataset means.
//
// Means are taken over the current dataset (not an external league
// reference), so profiles are relative to whoever was evaluated together.

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::config::ProfileConfig;
use crate::metrics::{resolve_keys, DerivedTable, Metric, MetricSet};

/// Rendering of an empty trait list.
pub const NO_TRAITS: &str = "None";

/// A list of metrics flagged for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TraitList {
    #[default]
    None,
    Metrics(Vec<Metric>),
}

impl TraitList {
    pub fn from_metrics(metrics: Vec<Metric>) -> Self {
        if metrics.is_empty() {
            TraitList::None
        } else {
            TraitList::Metrics(metrics)
        }
    }

    pub fn metrics(&self) -> &[Metric] {
        match self {
            TraitList::None => &[],
            TraitList::Metrics(m) => m,
        }
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.metrics().contains(&metric)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TraitList::None)
    }
}

impl fmt::Display for TraitList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraitList::None => f.write_str(NO_TRAITS),
            TraitList::Metrics(metrics) => {
                for (i, m) in metrics.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(m.key())?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for TraitList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub strengths: TraitList,
    pub weaknesses: TraitList,
}

/// Dataset means for the profiled metrics, in configured order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileBaseline {
    means: Vec<(Metric, f64)>,
    deviation_fraction: f64,
}

impl ProfileBaseline {
    /// Compute means over every row for each requested metric the table
    /// holds. Absent metrics are skipped.
    pub fn fit(table: &DerivedTable, metrics: &[Metric], deviation_fraction: f64) -> Self {
        let mut means = Vec::with_capacity(metrics.len());
        if !table.is_empty() {
            for &metric in metrics {
                if let Some(column) = table.column(metric) {
                    let mean = column.values.iter().sum::<f64>() / column.values.len() as f64;
                    means.push((metric, mean));
                }
            }
        }
        ProfileBaseline {
            means,
            deviation_fraction,
        }
    }

    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.means
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|&(_, mean)| mean)
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Flag each fitted metric of `row` as a strength (above the mean by
    /// more than `deviation_fraction * |mean|`) or a weakness (below by
    /// more than that). Order follows the fitted metric order.
    pub fn classify(&self, row: &MetricSet) -> PlayerProfile {
        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        for &(metric, mean) in &self.means {
            let Some(&value) = row.get(&metric) else {
                continue;
            };
            let threshold = mean.abs() * self.deviation_fraction;
            if value > mean + threshold {
                strengths.push(metric);
            } else if value < mean - threshold {
                weaknesses.push(metric);
            }
        }
        PlayerProfile {
            strengths: TraitList::from_metrics(strengths),
            weaknesses: TraitList::from_metrics(weaknesses),
        }
    }
}

/// Profile every row of `table` against the table's own means.
///
/// When none of the configured metrics are available every profile is empty.
pub fn profile_table(table: &DerivedTable, config: &ProfileConfig) -> Vec<PlayerProfile> {
    if table.is_empty() {
        warn!("no players to profile");
        return Vec::new();
    }
    let metrics = resolve_keys(&config.metrics);
    let baseline = ProfileBaseline::fit(table, &metrics, config.deviation_fraction);
    if baseline.is_empty() {
        warn!("no profile metrics available; strengths and weaknesses left empty");
    } else {
        debug!("profiling against means of {} metrics", baseline.means.len());
    }
    (0..table.len())
        .map(|row| baseline.classify(&table.row_metrics(row)))
        .collect()
}
