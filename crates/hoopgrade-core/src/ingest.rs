// Box-score CSV loading and cleaning.
//
// Headers decide which stat columns the table holds: a column that never
// appears in the header is "missing" for every row, which is different from a
// present column with an empty cell (filled with 0).

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::boxscore::{canonical_team, BoxScore, BoxScoreTable, PlayerRecord, StatColumn};
use crate::config::CleaningConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: &'static str },
}

// ---------------------------------------------------------------------------
// Header layout
// ---------------------------------------------------------------------------

const PLAYER_HEADERS: &[&str] = &["player", "name"];
const TEAM_HEADERS: &[&str] = &["team_id", "team", "tm"];
const POSITION_HEADERS: &[&str] = &["pos", "position"];

/// Column indices resolved from the header row.
#[derive(Debug)]
struct HeaderLayout {
    player: usize,
    team: Option<usize>,
    position: Option<usize>,
    stats: Vec<(StatColumn, usize)>,
}

fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase()
}

impl HeaderLayout {
    fn resolve(headers: &csv::StringRecord, source: &str) -> Result<Self, IngestError> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|c| names.iter().position(|n| n.as_str() == *c))
        };

        let player = find(PLAYER_HEADERS).ok_or_else(|| IngestError::MissingColumn {
            path: source.to_string(),
            column: "player",
        })?;

        let mut stats = Vec::new();
        for (idx, name) in names.iter().enumerate() {
            if let Some(col) = StatColumn::from_key(name) {
                if stats.iter().any(|&(c, _)| c == col) {
                    warn!("duplicate `{}` column in {}; using the first", name, source);
                    continue;
                }
                stats.push((col, idx));
            }
        }

        Ok(HeaderLayout {
            player,
            team: find(TEAM_HEADERS),
            position: find(POSITION_HEADERS),
            stats,
        })
    }

    fn columns(&self) -> BTreeSet<StatColumn> {
        self.stats.iter().map(|&(c, _)| c).collect()
    }
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Parse one stat cell. Empty and non-numeric cells count as 0.
fn parse_cell(raw: &str, column: StatColumn, player: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            warn!("non-numeric {} '{}' for '{}'; using 0", column, raw, player);
            0.0
        }
    }
}

fn parse_row(record: &csv::StringRecord, layout: &HeaderLayout) -> Option<PlayerRecord> {
    let player = record.get(layout.player).unwrap_or("").trim().to_string();
    if player.is_empty() {
        warn!("skipping row with empty player name");
        return None;
    }

    let mut stats = BoxScore::default();
    for &(column, idx) in &layout.stats {
        let value = parse_cell(record.get(idx).unwrap_or(""), column, &player);
        if !value.is_finite() {
            warn!("skipping player '{}': non-finite {} value", player, column);
            return None;
        }
        if value < 0.0 {
            warn!("skipping player '{}': negative {} value {}", player, column, value);
            return None;
        }
        stats.set(column, value);
    }

    let team = layout
        .team
        .and_then(|i| record.get(i))
        .unwrap_or("")
        .trim()
        .to_string();
    let position = layout
        .position
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from);

    Some(PlayerRecord {
        player,
        team,
        position,
        stats,
    })
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Read a box-score CSV from any reader. `source` names the input in errors
/// and log messages.
pub fn read_box_scores<R: Read>(rdr: R, source: &str) -> Result<BoxScoreTable, IngestError> {
    let csv_err = |e: csv::Error| IngestError::Csv {
        path: source.to_string(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new().flexible(false).from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let layout = HeaderLayout::resolve(&headers, source)?;
    debug!(
        "{}: {} stat columns recognised of {} headers",
        source,
        layout.stats.len(),
        headers.len()
    );

    let mut records = Vec::new();
    for result in reader.records() {
        match result {
            Ok(row) => {
                if let Some(record) = parse_row(&row, &layout) {
                    records.push(record);
                }
            }
            Err(e) => {
                warn!("skipping malformed row: {}", e);
            }
        }
    }

    Ok(BoxScoreTable::new(layout.columns(), records))
}

/// Load a box-score CSV file.
pub fn load_box_scores(path: &Path) -> Result<BoxScoreTable, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let table = read_box_scores(file, &path.display().to_string())?;
    info!("loaded {} players from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Apply playing-time filters and canonicalize team codes.
///
/// The minutes filter only applies when the table has an `mp` column, and the
/// games filter only when it has a `g` column.
pub fn clean_table(table: &BoxScoreTable, config: &CleaningConfig) -> BoxScoreTable {
    let filter_minutes = table.has_column(StatColumn::Mp);
    let filter_games = table.has_column(StatColumn::G);
    let min_games = f64::from(config.min_games);

    let records: Vec<PlayerRecord> = table
        .records()
        .iter()
        .filter(|r| !filter_minutes || r.stats.mp >= config.min_minutes)
        .filter(|r| !filter_games || r.stats.g >= min_games)
        .map(|r| PlayerRecord {
            player: r.player.trim().to_string(),
            team: canonical_team(&r.team),
            ..r.clone()
        })
        .collect();

    let dropped = table.len() - records.len();
    if dropped > 0 {
        debug!("dropped {} players below playing-time thresholds", dropped);
    }
    info!("cleaned data: {} players remaining", records.len());

    BoxScoreTable::new(table.columns().iter().copied(), records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
