// Persisting evaluation results: the ranked table as CSV and the model
// summary as JSON.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::metrics::Metric;
use crate::normalize::normalized_column_name;
use crate::pipeline::{EvaluationTable, PlayerEvaluation};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Header row of the exported evaluation table.
pub fn evaluation_headers(table: &EvaluationTable) -> Vec<String> {
    let mut headers = vec!["player".to_string(), "team_id".to_string()];
    headers.extend(table.raw_columns().iter().map(|c| c.key().to_string()));
    headers.extend(Metric::ALL.iter().map(|m| m.key().to_string()));
    headers.push("position".into());
    headers.push("position_source".into());
    headers.extend(
        table
            .normalized_metrics()
            .iter()
            .map(|&m| normalized_column_name(m)),
    );
    headers.extend(
        ["strength_score", "player_tier", "strengths", "weaknesses"]
            .into_iter()
            .map(String::from),
    );
    headers
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn evaluation_row(table: &EvaluationTable, row: &PlayerEvaluation) -> Vec<String> {
    let mut fields = vec![row.player().to_string(), row.team().to_string()];
    fields.extend(
        table
            .raw_columns()
            .iter()
            .map(|&c| row.record.stats.get(c).to_string()),
    );
    fields.extend(Metric::ALL.iter().map(|&m| optional(row.metric(m))));
    fields.push(row.position.clone());
    fields.push(row.position_source.label().to_string());
    fields.extend(
        table
            .normalized_metrics()
            .iter()
            .map(|m| optional(row.normalized.get(m).copied())),
    );
    fields.push(row.strength_score.to_string());
    fields.push(row.tier.label().to_string());
    fields.push(row.profile.strengths.to_string());
    fields.push(row.profile.weaknesses.to_string());
    fields
}

/// Write the ranked table as CSV to any writer.
pub fn write_evaluations_to<W: Write>(table: &EvaluationTable, wtr: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(evaluation_headers(table))?;
    for row in table.rows() {
        writer.write_record(evaluation_row(table, row))?;
    }
    writer.flush()?;
    Ok(())
}

fn create_file(path: &Path) -> Result<std::fs::File, ExportError> {
    let io_err = |e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::File::create(path).map_err(io_err)
}

/// Write the ranked table to a CSV file, creating parent directories.
pub fn write_evaluations(table: &EvaluationTable, path: &Path) -> Result<(), ExportError> {
    let file = create_file(path)?;
    write_evaluations_to(table, file).map_err(|e| ExportError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    info!("wrote {} evaluations to {}", table.len(), path.display());
    Ok(())
}

/// Write any serializable summary as pretty-printed JSON.
pub fn write_summary<T: Serialize>(summary: &T, path: &Path) -> Result<(), ExportError> {
    let file = create_file(path)?;
    serde_json::to_writer_pretty(file, summary).map_err(|e| ExportError::Json {
        path: path.display().to_string(),
        source: e,
    })?;
    info!("wrote model summary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxscore::sample_table;
    use crate::config::ModelConfig;
    use crate::pipeline::evaluate;
    use crate::query::summarize;

    fn exported_csv(table: &EvaluationTable) -> String {
        let mut buf = Vec::new();
        write_evaluations_to(table, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn headers_follow_column_groups() {
        let table = evaluate(&sample_table(), &ModelConfig::default());
        let headers = evaluation_headers(&table);
        assert_eq!(&headers[..3], &["player", "team_id", "g"]);
        let position = headers.iter().position(|h| h == "position").unwrap();
        assert_eq!(headers[position + 1], "position_source");
        assert_eq!(headers[position - 1], "per");
        assert!(headers.contains(&"ts_pct_norm".to_string()));
        assert!(!headers.contains(&"game_score_norm".to_string()));
        assert_eq!(
            &headers[headers.len() - 4..],
            &["strength_score", "player_tier", "strengths", "weaknesses"]
        );
    }

    #[test]
    fn rows_are_written_in_ranking_order() {
        let table = evaluate(&sample_table(), &ModelConfig::default());
        let text = exported_csv(&table);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        let tier_idx = headers.iter().position(|h| h == "player_tier").unwrap();
        let strengths_idx = headers.iter().position(|h| h == "strengths").unwrap();

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(&rows[0][0], "Nikola Jokic");
        assert_eq!(&rows[0][tier_idx], "Starter");
        assert_eq!(&rows[0][strengths_idx], "ast_pct, tov_pct, treb_pct");
        assert_eq!(&rows[4][0], "LeBron James");
        assert_eq!(&rows[4][strengths_idx], "None");
        assert!(rows.iter().all(|r| r.len() == headers.len()));
    }

    #[test]
    fn empty_table_writes_header_only() {
        let text = exported_csv(&EvaluationTable::default());
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("player,team_id,"));
    }

    #[test]
    fn writes_files_and_creates_directories() {
        let tmp = std::env::temp_dir().join("hoopgrade_export_test");
        let _ = std::fs::remove_dir_all(&tmp);
        let table = evaluate(&sample_table(), &ModelConfig::default());

        let csv_path = tmp.join("processed").join("evaluation.csv");
        write_evaluations(&table, &csv_path).unwrap();
        assert!(csv_path.exists());

        let json_path = tmp.join("processed").join("summary.json");
        write_summary(&summarize(&table).unwrap(), &json_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["total_players"], 5);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
