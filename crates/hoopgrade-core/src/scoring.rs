// Position-weighted composite strength score.
//
// Each row's normalized metrics are combined with the weight table for its
// position. Only metrics actually present contribute, and the sum is divided
// by the weight actually used, so a partially normalized row is still a
// weighted average in [0, 1].

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::config::{PositionWeights, WeightTable};
use crate::metrics::MetricSet;
use crate::normalize::NormalizedTable;
use crate::position::Position;

/// Weighted average of the normalized metrics present in `normalized`.
///
/// Returns 0 when none of the weighted metrics are available.
pub fn weighted_score(normalized: &MetricSet, weights: &PositionWeights) -> f64 {
    let (sum, used) = weights
        .iter()
        .filter_map(|(metric, weight)| normalized.get(&metric).map(|&v| (v * weight, weight)))
        .fold((0.0, 0.0), |(sum, used), (contribution, weight)| {
            (sum + contribution, used + weight)
        });
    if used > 0.0 {
        sum / used
    } else {
        0.0
    }
}

/// Score every row using the weight table for its position label.
///
/// Labels outside PG/SG/SF/PF/C are scored with the SF weights.
pub fn score_table(
    normalized: &NormalizedTable,
    positions: &[String],
    weights: &WeightTable,
) -> Vec<f64> {
    if normalized.is_empty() || positions.is_empty() {
        warn!("no players to score");
        return Vec::new();
    }
    let mut unknown_labels = BTreeSet::new();
    let scores = positions
        .iter()
        .enumerate()
        .map(|(row, label)| {
            if Position::from_label(label).is_none() {
                unknown_labels.insert(label.as_str());
            }
            weighted_score(&normalized.row(row), weights.for_label(label))
        })
        .collect::<Vec<_>>();

    if !unknown_labels.is_empty() {
        warn!(
            "unrecognised position labels {:?}; scored with SF weights",
            unknown_labels
        );
    }
    debug!("scored {} players", scores.len());
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxscore::sample_table;
    use crate::config::ModelConfig;
    use crate::metrics::{derive_metrics, Metric};
    use crate::normalize::normalize;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn set(pairs: &[(Metric, f64)]) -> MetricSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn full_row_is_nominal_weighted_average() {
        let weights = PositionWeights::new(&[(Metric::TsPct, 0.75), (Metric::Per, 0.25)]);
        let row = set(&[(Metric::TsPct, 0.4), (Metric::Per, 0.8)]);
        assert!(approx_eq(weighted_score(&row, &weights), 0.5, 1e-12));
    }

    #[test]
    fn missing_metrics_renormalize_over_used_weight() {
        let weights = PositionWeights::new(&[(Metric::TsPct, 0.75), (Metric::Per, 0.25)]);
        let row = set(&[(Metric::Per, 0.8)]);
        assert!(approx_eq(weighted_score(&row, &weights), 0.8, 1e-12));
    }

    #[test]
    fn unweighted_metrics_are_ignored() {
        let weights = PositionWeights::new(&[(Metric::TsPct, 1.0)]);
        let row = set(&[(Metric::TsPct, 0.3), (Metric::TrebPct, 1.0)]);
        assert!(approx_eq(weighted_score(&row, &weights), 0.3, 1e-12));
    }

    #[test]
    fn no_overlap_scores_zero() {
        let weights = WeightTable::default();
        let row = set(&[(Metric::GameScore, 1.0)]);
        assert_eq!(weighted_score(&row, &weights.pg), 0.0);
        assert_eq!(weighted_score(&MetricSet::new(), &weights.c), 0.0);
    }

    #[test]
    fn unknown_label_scores_like_sf() {
        let config = ModelConfig::default();
        let derived = derive_metrics(&sample_table(), &config.metrics);
        let normalized = normalize(&derived, &config.normalization.metrics);

        let unknown = score_table(&normalized, &vec!["XX".to_string(); 5], &config.weights);
        let sf = score_table(&normalized, &vec!["SF".to_string(); 5], &config.weights);
        assert_eq!(unknown, sf);
        // Jokic under SF weights
        assert!(approx_eq(sf[4], 0.7714, 1e-3));
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let config = ModelConfig::default();
        let derived = derive_metrics(&sample_table(), &config.metrics);
        let normalized = normalize(&derived, &config.normalization.metrics);
        for label in ["PG", "SG", "SF", "PF", "C"] {
            let scores = score_table(&normalized, &vec![label.to_string(); 5], &config.weights);
            for s in scores {
                assert!((0.0..=1.0).contains(&s), "{label}: {s}");
            }
        }
    }

    #[test]
    fn position_weights_change_the_result() {
        let config = ModelConfig::default();
        let derived = derive_metrics(&sample_table(), &config.metrics);
        let normalized = normalize(&derived, &config.normalization.metrics);
        let pg = score_table(&normalized, &vec!["PG".to_string(); 5], &config.weights);
        let c = score_table(&normalized, &vec!["C".to_string(); 5], &config.weights);
        assert!(approx_eq(pg[4], 0.8191, 1e-3));
        assert!(c[4] != pg[4]);
    }

    #[test]
    fn empty_table_scores_nothing() {
        let weights = ModelConfig::default().weights;
        assert!(score_table(&NormalizedTable::default(), &[], &weights).is_empty());
    }
}
