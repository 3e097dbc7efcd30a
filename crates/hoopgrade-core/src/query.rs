// Read-only views over an evaluated table: rankings, side-by-side
// comparison and the model summary.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::metrics::Metric;
use crate::pipeline::{EvaluationTable, PlayerEvaluation};
use crate::profile::TraitList;
use crate::tier::Tier;

/// Number of players listed in the summary ranking.
pub const SUMMARY_TOP_N: usize = 5;

/// First `n` players in ranking order, optionally restricted to one tier.
pub fn top_players(
    table: &EvaluationTable,
    n: usize,
    tier: Option<Tier>,
) -> Vec<&PlayerEvaluation> {
    table
        .rows()
        .iter()
        .filter(|r| tier.is_none_or(|t| r.tier == t))
        .take(n)
        .collect()
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Key columns for one player in a side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerComparison {
    pub player: String,
    pub position: String,
    pub strength_score: f64,
    pub player_tier: Tier,
    pub efg_pct: Option<f64>,
    pub ts_pct: Option<f64>,
    pub ast_pct: Option<f64>,
    pub tov_pct: Option<f64>,
    pub usg_pct: Option<f64>,
    pub per: Option<f64>,
    pub strengths: TraitList,
    pub weaknesses: TraitList,
}

impl From<&PlayerEvaluation> for PlayerComparison {
    fn from(row: &PlayerEvaluation) -> Self {
        PlayerComparison {
            player: row.player().to_string(),
            position: row.position.clone(),
            strength_score: row.strength_score,
            player_tier: row.tier,
            efg_pct: row.metric(Metric::EfgPct),
            ts_pct: row.metric(Metric::TsPct),
            ast_pct: row.metric(Metric::AstPct),
            tov_pct: row.metric(Metric::TovPct),
            usg_pct: row.metric(Metric::UsgPct),
            per: row.metric(Metric::Per),
            strengths: row.profile.strengths.clone(),
            weaknesses: row.profile.weaknesses.clone(),
        }
    }
}

/// Comparison rows for the named players, in ranking order. Names must match
/// exactly; unmatched names are ignored.
pub fn compare_players<S: AsRef<str>>(
    table: &EvaluationTable,
    names: &[S],
) -> Vec<PlayerComparison> {
    let rows: Vec<PlayerComparison> = table
        .rows()
        .iter()
        .filter(|r| names.iter().any(|n| n.as_ref() == r.player()))
        .map(PlayerComparison::from)
        .collect();

    if rows.is_empty() && !table.is_empty() {
        warn!(
            "no players found: {:?}",
            names.iter().map(|n| n.as_ref()).collect::<Vec<&str>>()
        );
    }
    rows
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent for a single player.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl ScoreStats {
    /// `None` for an empty slice.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;

        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        let std = (scores.len() > 1).then(|| {
            let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        });

        Some(ScoreStats {
            mean,
            median,
            std,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub player: String,
    pub position: String,
    pub strength_score: f64,
    pub player_tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub total_players: usize,
    pub tier_distribution: BTreeMap<Tier, usize>,
    pub position_distribution: BTreeMap<String, usize>,
    pub strength_score_stats: ScoreStats,
    pub top_players: Vec<RankedPlayer>,
}

/// Aggregate view of an evaluated table. `None` when the table is empty.
pub fn summarize(table: &EvaluationTable) -> Option<ModelSummary> {
    let scores: Vec<f64> = table.rows().iter().map(|r| r.strength_score).collect();
    let strength_score_stats = ScoreStats::from_scores(&scores)?;

    let mut tier_distribution = BTreeMap::new();
    let mut position_distribution = BTreeMap::new();
    for row in table.rows() {
        *tier_distribution.entry(row.tier).or_insert(0) += 1;
        *position_distribution.entry(row.position.clone()).or_insert(0) += 1;
    }

    let top_players = top_players(table, SUMMARY_TOP_N, None)
        .into_iter()
        .map(|r| RankedPlayer {
            player: r.player().to_string(),
            position: r.position.clone(),
            strength_score: r.strength_score,
            player_tier: r.tier,
        })
        .collect();

    Some(ModelSummary {
        total_players: table.len(),
        tier_distribution,
        position_distribution,
        strength_score_stats,
        top_players,
    })
}
