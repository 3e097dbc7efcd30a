// Position labels and the statistical position estimator.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::metrics::{DerivedTable, Metric};

/// Basketball positions used as keys into the scoring weight tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    PG,
    SG,
    SF,
    PF,
    C,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::PG,
        Position::SG,
        Position::SF,
        Position::PF,
        Position::C,
    ];

    /// Parse a position label. Case-insensitive, surrounding whitespace ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "PG" => Some(Position::PG),
            "SG" => Some(Position::SG),
            "SF" => Some(Position::SF),
            "PF" => Some(Position::PF),
            "C" => Some(Position::C),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Position::PG => "PG",
            Position::SG => "SG",
            Position::SF => "SF",
            Position::PF => "PF",
            Position::C => "C",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a row's position label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    Supplied,
    Estimated,
}

impl PositionSource {
    pub fn label(&self) -> &'static str {
        match self {
            PositionSource::Supplied => "supplied",
            PositionSource::Estimated => "estimated",
        }
    }
}

/// Coarse position guess from assist % and total rebound %.
///
/// Rules are checked top to bottom and the first match wins:
/// 1. AST% > 15 and REB% < 8  → PG
/// 2. AST% > 10 and REB% < 10 → SG
/// 3. REB% > 12 and AST% < 8  → C
/// 4. REB% > 10 and AST% < 10 → PF
/// 5. otherwise               → SF
pub fn estimate_position(ast_pct: f64, treb_pct: f64) -> Position {
    if ast_pct > 15.0 && treb_pct < 8.0 {
        Position::PG
    } else if ast_pct > 10.0 && treb_pct < 10.0 {
        Position::SG
    } else if treb_pct > 12.0 && ast_pct < 8.0 {
        Position::C
    } else if treb_pct > 10.0 && ast_pct < 10.0 {
        Position::PF
    } else {
        Position::SF
    }
}

/// Estimate a position for every row. Rows lacking either input metric are
/// treated as having 0 for it.
pub fn estimate_positions(table: &DerivedTable) -> Vec<Position> {
    if table.is_empty() {
        warn!("no players to estimate positions for");
        return Vec::new();
    }
    (0..table.len())
        .map(|row| {
            let ast = table.value(row, Metric::AstPct).unwrap_or(0.0);
            let reb = table.value(row, Metric::TrebPct).unwrap_or(0.0);
            estimate_position(ast, reb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxscore::sample_table;
    use crate::config::MetricsConfig;
    use crate::metrics::derive_metrics;

    #[test]
    fn rule_order_first_match_wins() {
        assert_eq!(estimate_position(20.0, 5.0), Position::PG);
        // Fails PG on rebounds, passes SG
        assert_eq!(estimate_position(20.0, 9.0), Position::SG);
        assert_eq!(estimate_position(12.0, 5.0), Position::SG);
        assert_eq!(estimate_position(5.0, 15.0), Position::C);
        // Fails C on assists, passes PF
        assert_eq!(estimate_position(9.0, 15.0), Position::PF);
        assert_eq!(estimate_position(5.0, 11.0), Position::PF);
    }

    #[test]
    fn ambiguous_profiles_default_to_sf() {
        assert_eq!(estimate_position(0.0, 0.0), Position::SF);
        assert_eq!(estimate_position(12.0, 12.0), Position::SF);
        assert_eq!(estimate_position(10.0, 10.0), Position::SF);
    }

    #[test]
    fn thresholds_are_strict() {
        // Exactly on a boundary never satisfies a strict comparison.
        assert_eq!(estimate_position(15.0, 7.0), Position::SG);
        assert_eq!(estimate_position(10.0, 7.0), Position::SF);
        assert_eq!(estimate_position(7.0, 12.0), Position::PF);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        for pos in Position::ALL {
            assert_eq!(Position::from_label(pos.label()), Some(pos));
        }
        assert_eq!(Position::from_label(" pf "), Some(Position::PF));
        assert_eq!(Position::from_label("XX"), None);
        assert_eq!(Position::from_label("G-F"), None);
    }

    #[test]
    fn sample_players_estimate_as_point_guards() {
        // The simplified AST% runs far above 15 for every high-usage star,
        // while the per-36 rebound proxy stays below 1.
        let derived = derive_metrics(&sample_table(), &MetricsConfig::default());
        let positions = estimate_positions(&derived);
        assert_eq!(positions, vec![Position::PG; 5]);
    }

    #[test]
    fn empty_table_estimates_nothing() {
        assert!(estimate_positions(&DerivedTable::default()).is_empty());
    }

    #[test]
    fn missing_inputs_estimate_as_sf() {
        let derived = derive_metrics(&sample_table(), &MetricsConfig::default())
            .without_metric(Metric::AstPct)
            .without_metric(Metric::TrebPct);
        assert_eq!(estimate_positions(&derived), vec![Position::SF; 5]);
    }
}
