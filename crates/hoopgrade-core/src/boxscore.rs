// Raw per-game box-score data model.
//
// A `BoxScoreTable` carries the rows plus the set of stat columns that were
// actually present in the source. Column presence is a property of the whole
// table, not of individual rows: a metric whose inputs are missing falls back
// to its default for every row.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Stat columns
// ---------------------------------------------------------------------------

/// Identifier of a raw counting-stat column. Keys match the per-game table
/// headers (`fg`, `fga`, `fg3`, ...) and are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatColumn {
    G,
    Gs,
    Mp,
    Fg,
    Fga,
    Fg3,
    Fg3a,
    Ft,
    Fta,
    Orb,
    Drb,
    Trb,
    Ast,
    Stl,
    Blk,
    Tov,
    Pf,
    Pts,
}

impl StatColumn {
    pub const ALL: [StatColumn; 18] = [
        StatColumn::G,
        StatColumn::Gs,
        StatColumn::Mp,
        StatColumn::Fg,
        StatColumn::Fga,
        StatColumn::Fg3,
        StatColumn::Fg3a,
        StatColumn::Ft,
        StatColumn::Fta,
        StatColumn::Orb,
        StatColumn::Drb,
        StatColumn::Trb,
        StatColumn::Ast,
        StatColumn::Stl,
        StatColumn::Blk,
        StatColumn::Tov,
        StatColumn::Pf,
        StatColumn::Pts,
    ];

    /// Column header for this stat.
    pub fn key(self) -> &'static str {
        match self {
            StatColumn::G => "g",
            StatColumn::Gs => "gs",
            StatColumn::Mp => "mp",
            StatColumn::Fg => "fg",
            StatColumn::Fga => "fga",
            StatColumn::Fg3 => "fg3",
            StatColumn::Fg3a => "fg3a",
            StatColumn::Ft => "ft",
            StatColumn::Fta => "fta",
            StatColumn::Orb => "orb",
            StatColumn::Drb => "drb",
            StatColumn::Trb => "trb",
            StatColumn::Ast => "ast",
            StatColumn::Stl => "stl",
            StatColumn::Blk => "blk",
            StatColumn::Tov => "tov",
            StatColumn::Pf => "pf",
            StatColumn::Pts => "pts",
        }
    }

    /// Parse a column header. Exact match only; `"FG"` is not `fg`.
    pub fn from_key(key: &str) -> Option<Self> {
        StatColumn::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for StatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Per-game counting stats for one player-season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub g: f64,
    pub gs: f64,
    pub mp: f64,
    pub fg: f64,
    pub fga: f64,
    pub fg3: f64,
    pub fg3a: f64,
    pub ft: f64,
    pub fta: f64,
    pub orb: f64,
    pub drb: f64,
    pub trb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub tov: f64,
    pub pf: f64,
    pub pts: f64,
}

impl BoxScore {
    pub fn get(&self, column: StatColumn) -> f64 {
        match column {
            StatColumn::G => self.g,
            StatColumn::Gs => self.gs,
            StatColumn::Mp => self.mp,
            StatColumn::Fg => self.fg,
            StatColumn::Fga => self.fga,
            StatColumn::Fg3 => self.fg3,
            StatColumn::Fg3a => self.fg3a,
            StatColumn::Ft => self.ft,
            StatColumn::Fta => self.fta,
            StatColumn::Orb => self.orb,
            StatColumn::Drb => self.drb,
            StatColumn::Trb => self.trb,
            StatColumn::Ast => self.ast,
            StatColumn::Stl => self.stl,
            StatColumn::Blk => self.blk,
            StatColumn::Tov => self.tov,
            StatColumn::Pf => self.pf,
            StatColumn::Pts => self.pts,
        }
    }

    pub fn set(&mut self, column: StatColumn, value: f64) {
        let slot = match column {
            StatColumn::G => &mut self.g,
            StatColumn::Gs => &mut self.gs,
            StatColumn::Mp => &mut self.mp,
            StatColumn::Fg => &mut self.fg,
            StatColumn::Fga => &mut self.fga,
            StatColumn::Fg3 => &mut self.fg3,
            StatColumn::Fg3a => &mut self.fg3a,
            StatColumn::Ft => &mut self.ft,
            StatColumn::Fta => &mut self.fta,
            StatColumn::Orb => &mut self.orb,
            StatColumn::Drb => &mut self.drb,
            StatColumn::Trb => &mut self.trb,
            StatColumn::Ast => &mut self.ast,
            StatColumn::Stl => &mut self.stl,
            StatColumn::Blk => &mut self.blk,
            StatColumn::Tov => &mut self.tov,
            StatColumn::Pf => &mut self.pf,
            StatColumn::Pts => &mut self.pts,
        };
        *slot = value;
    }
}

/// One player-season row: identity plus counting stats.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player: String,
    pub team: String,
    /// Position label supplied by the source, if any. Kept verbatim (trimmed)
    /// so unrecognised labels reach the scorer's fallback.
    pub position: Option<String>,
    pub stats: BoxScore,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// The raw input table: rows plus the stat columns present in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxScoreTable {
    columns: BTreeSet<StatColumn>,
    records: Vec<PlayerRecord>,
}

impl BoxScoreTable {
    pub fn new(columns: impl IntoIterator<Item = StatColumn>, records: Vec<PlayerRecord>) -> Self {
        BoxScoreTable {
            columns: columns.into_iter().collect(),
            records,
        }
    }

    /// A table that claims every stat column.
    pub fn with_all_columns(records: Vec<PlayerRecord>) -> Self {
        Self::new(StatColumn::ALL, records)
    }

    pub fn columns(&self) -> &BTreeSet<StatColumn> {
        &self.columns
    }

    pub fn has_column(&self, column: StatColumn) -> bool {
        self.columns.contains(&column)
    }

    /// The subset of `required` that this table lacks, in the given order.
    pub fn missing_columns(&self, required: &[StatColumn]) -> Vec<StatColumn> {
        required
            .iter()
            .copied()
            .filter(|c| !self.columns.contains(c))
            .collect()
    }

    /// Drop a column from the table's column set. Row values are left in
    /// place but are no longer considered present.
    pub fn without_column(mut self, column: StatColumn) -> Self {
        self.columns.remove(&column);
        self
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
}

// ---------------------------------------------------------------------------
// Team aliases
// ---------------------------------------------------------------------------

/// Historical or site-specific team codes and their canonical form.
const TEAM_ALIASES: &[(&str, &str)] = &[("BRK", "BKN"), ("CHO", "CHA"), ("PHO", "PHX")];

/// Canonical 3-letter team code. Codes without an alias pass through
/// trimmed but otherwise unchanged.
pub fn canonical_team(code: &str) -> String {
    let code = code.trim();
    TEAM_ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map_or(code, |(_, canonical)| *canonical)
        .to_string()
}

// ---------------------------------------------------------------------------
// Sample dataset
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn sample_row(
    player: &str,
    team: &str,
    g: f64,
    gs: f64,
    mp: f64,
    shooting: [f64; 6],
    boards: [f64; 3],
    rest: [f64; 6],
) -> PlayerRecord {
    let [fg, fga, fg3, fg3a, ft, fta] = shooting;
    let [orb, drb, trb] = boards;
    let [ast, stl, blk, tov, pf, pts] = rest;
    PlayerRecord {
        player: player.to_string(),
        team: team.to_string(),
        position: None,
        stats: BoxScore {
            g,
            gs,
            mp,
            fg,
            fga,
            fg3,
            fg3a,
            ft,
            fta,
            orb,
            drb,
            trb,
            ast,
            stl,
            blk,
            tov,
            pf,
            pts,
        },
    }
}

/// Five-player development dataset with realistic per-game numbers.
pub fn sample_table() -> BoxScoreTable {
    let records = vec![
        sample_row(
            "LeBron James",
            "LAL",
            55.0,
            54.0,
            35.5,
            [8.2, 16.5, 1.8, 5.4, 4.8, 6.2],
            [1.1, 6.2, 7.3],
            [7.3, 1.1, 0.6, 3.5, 1.8, 25.0],
        ),
        sample_row(
            "Stephen Curry",
            "GSW",
            56.0,
            56.0,
            32.7,
            [8.8, 18.3, 4.4, 11.4, 4.2, 4.6],
            [0.6, 4.1, 4.7],
            [6.3, 0.9, 0.4, 3.2, 2.0, 26.4],
        ),
        sample_row(
            "Kevin Durant",
            "PHX",
            47.0,
            47.0,
            37.2,
            [9.1, 17.2, 2.1, 5.1, 6.1, 6.8],
            [0.7, 6.4, 7.1],
            [5.6, 0.8, 1.2, 3.1, 2.1, 29.9],
        ),
        sample_row(
            "Giannis Antetokounmpo",
            "MIL",
            63.0,
            63.0,
            32.1,
            [10.3, 18.4, 0.8, 2.8, 7.8, 9.6],
            [1.8, 8.2, 10.0],
            [5.7, 1.0, 0.8, 3.4, 2.8, 30.1],
        ),
        sample_row(
            "Nikola Jokic",
            "DEN",
            69.0,
            69.0,
            33.7,
            [8.9, 14.8, 1.1, 3.0, 5.9, 6.8],
            [2.9, 8.9, 11.8],
            [9.8, 1.2, 0.7, 3.6, 2.4, 24.5],
        ),
    ];
    BoxScoreTable::with_all_columns(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
