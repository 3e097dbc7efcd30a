// End-to-end evaluation: derive → position → normalize → score → tier →
// profile, then rank by score.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::boxscore::{BoxScoreTable, PlayerRecord, StatColumn};
use crate::config::ModelConfig;
use crate::metrics::{derive_metrics, Metric, MetricSet};
use crate::normalize::normalize;
use crate::position::{estimate_positions, Position, PositionSource};
use crate::profile::{profile_table, PlayerProfile};
use crate::scoring::score_table;
use crate::tier::Tier;

/// One fully evaluated player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEvaluation {
    pub record: PlayerRecord,
    pub metrics: MetricSet,
    pub position: String,
    pub position_source: PositionSource,
    pub normalized: MetricSet,
    pub strength_score: f64,
    pub tier: Tier,
    pub profile: PlayerProfile,
}

impl PlayerEvaluation {
    pub fn player(&self) -> &str {
        &self.record.player
    }

    pub fn team(&self) -> &str {
        &self.record.team
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

/// Evaluated players ordered by descending strength score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationTable {
    raw_columns: BTreeSet<StatColumn>,
    normalized_metrics: Vec<Metric>,
    rows: Vec<PlayerEvaluation>,
}

impl EvaluationTable {
    pub fn rows(&self) -> &[PlayerEvaluation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw stat columns present in the evaluated input.
    pub fn raw_columns(&self) -> &BTreeSet<StatColumn> {
        &self.raw_columns
    }

    /// Metrics that received a normalized column.
    pub fn normalized_metrics(&self) -> &[Metric] {
        &self.normalized_metrics
    }

    pub fn find(&self, player: &str) -> Option<&PlayerEvaluation> {
        self.rows.iter().find(|r| r.record.player == player)
    }
}

/// Supplied label (trimmed) when present and non-empty, else the estimate.
fn resolve_positions(
    records: &[PlayerRecord],
    estimated: &[Position],
) -> Vec<(String, PositionSource)> {
    records
        .iter()
        .zip(estimated)
        .map(|(record, estimate)| {
            match record.position.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => (label.to_string(), PositionSource::Supplied),
                _ => (estimate.label().to_string(), PositionSource::Estimated),
            }
        })
        .collect()
}

/// Run the complete evaluation over `table`.
///
/// Never fails: missing inputs degrade to defaults and are logged. An empty
/// table yields an empty result.
pub fn evaluate(table: &BoxScoreTable, config: &ModelConfig) -> EvaluationTable {
    if table.is_empty() {
        warn!("empty table provided for strength evaluation");
        return EvaluationTable {
            raw_columns: table.columns().clone(),
            ..Default::default()
        };
    }

    info!("starting player strength evaluation for {} players", table.len());

    let derived = derive_metrics(table, &config.metrics);

    let estimated = estimate_positions(&derived);
    let positions = resolve_positions(derived.records(), &estimated);
    let supplied = positions
        .iter()
        .filter(|(_, s)| *s == PositionSource::Supplied)
        .count();
    debug!(
        "positions: {} supplied, {} estimated",
        supplied,
        positions.len() - supplied
    );

    let normalized = normalize(&derived, &config.normalization.metrics);
    let labels: Vec<String> = positions.iter().map(|(label, _)| label.clone()).collect();
    let scores = score_table(&normalized, &labels, &config.weights);
    let profiles = profile_table(&derived, &config.profile);

    let mut rows: Vec<PlayerEvaluation> = derived
        .records()
        .iter()
        .zip(positions)
        .zip(scores)
        .zip(profiles)
        .enumerate()
        .map(|(row, (((record, (position, position_source)), score), profile))| {
            PlayerEvaluation {
                record: record.clone(),
                metrics: derived.row_metrics(row),
                position,
                position_source,
                normalized: normalized.row(row),
                strength_score: score,
                tier: Tier::classify(score, &config.tiers),
                profile,
            }
        })
        .collect();

    // Stable: tied scores keep input order
    rows.sort_by(|a, b| {
        b.strength_score
            .partial_cmp(&a.strength_score)
            .unwrap_or(Ordering::Equal)
    });

    info!("completed strength evaluation for {} players", rows.len());

    EvaluationTable {
        raw_columns: table.columns().clone(),
        normalized_metrics: normalized.metrics().collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxscore::{sample_table, BoxScore};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn player(name: &str, position: Option<&str>, stats: BoxScore) -> PlayerRecord {
        PlayerRecord {
            player: name.into(),
            team: "TST".into(),
            position: position.map(String::from),
            stats,
        }
    }

    #[test]
    fn sample_ranking() {
        let result = evaluate(&sample_table(), &ModelConfig::default());
        let names: Vec<&str> = result.rows().iter().map(|r| r.player()).collect();
        assert_eq!(
            names,
            vec![
                "Nikola Jokic",
                "Giannis Antetokounmpo",
                "Kevin Durant",
                "Stephen Curry",
                "LeBron James"
            ]
        );
        let top = &result.rows()[0];
        assert!(approx_eq(top.strength_score, 0.8191, 1e-3));
        assert_eq!(top.tier, Tier::Starter);
        assert_eq!(top.position, "PG");
        assert_eq!(top.position_source, PositionSource::Estimated);
        assert_eq!(result.find("LeBron James").map(|r| r.tier), Some(Tier::Reserve));
        assert_eq!(
            result.find("Giannis Antetokounmpo").map(|r| r.tier),
            Some(Tier::BenchPlayer)
        );
    }

    #[test]
    fn every_row_carries_all_outputs() {
        let config = ModelConfig::default();
        let result = evaluate(&sample_table(), &config);
        assert_eq!(result.len(), 5);
        assert_eq!(result.normalized_metrics().len(), config.normalization.metrics.len());
        for row in result.rows() {
            assert_eq!(row.metrics.len(), Metric::ALL.len());
            assert_eq!(row.normalized.len(), 10);
            assert!((0.0..=1.0).contains(&row.strength_score));
            assert_eq!(row.tier, Tier::classify(row.strength_score, &config.tiers));
        }
    }

    #[test]
    fn supplied_position_overrides_estimate() {
        let mut records = sample_table().records().to_vec();
        records[4].position = Some(" C ".into());
        records[0].position = Some("   ".into());
        let table = BoxScoreTable::with_all_columns(records);
        let result = evaluate(&table, &ModelConfig::default());

        let jokic = result.find("Nikola Jokic").unwrap();
        assert_eq!(jokic.position, "C");
        assert_eq!(jokic.position_source, PositionSource::Supplied);
        assert!(approx_eq(jokic.strength_score, 0.8307, 1e-3));

        // Blank labels count as absent
        let lebron = result.find("LeBron James").unwrap();
        assert_eq!(lebron.position_source, PositionSource::Estimated);
    }

    #[test]
    fn unknown_supplied_label_is_kept_and_scored_as_sf() {
        let mut records = sample_table().records().to_vec();
        records[4].position = Some("XX".into());
        let result = evaluate(&BoxScoreTable::with_all_columns(records), &ModelConfig::default());
        let jokic = result.find("Nikola Jokic").unwrap();
        assert_eq!(jokic.position, "XX");
        assert!(approx_eq(jokic.strength_score, 0.7714, 1e-3));
    }

    #[test]
    fn ties_keep_input_order() {
        let stats = BoxScore {
            mp: 30.0,
            pts: 20.0,
            fga: 15.0,
            fg: 7.0,
            ..Default::default()
        };
        let table = BoxScoreTable::with_all_columns(vec![
            player("First", None, stats),
            player("Second", None, stats),
            player("Third", None, stats),
        ]);
        let result = evaluate(&table, &ModelConfig::default());
        let names: Vec<&str> = result.rows().iter().map(|r| r.player()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
        // Every metric is constant, so every normalized value is the midpoint
        for row in result.rows() {
            assert!(approx_eq(row.strength_score, 0.5, 1e-12));
            assert_eq!(row.tier, Tier::RolePlayer);
        }
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = evaluate(&BoxScoreTable::default(), &ModelConfig::default());
        assert!(result.is_empty());
        assert!(result.normalized_metrics().is_empty());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let config = ModelConfig::default();
        let first = evaluate(&sample_table(), &config);
        let second = evaluate(&sample_table(), &config);
        assert_eq!(first, second);
    }
}
