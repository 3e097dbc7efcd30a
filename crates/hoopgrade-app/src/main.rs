// Player strength evaluation entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr)
// 2. Load config (copying defaults on first run)
// 3. Load box scores (CSV file or built-in sample) and clean them
// 4. Run the evaluation pipeline
// 5. Write the ranked table and model summary
// 6. Print the top of the ranking

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use hoopgrade_core::boxscore::{sample_table, BoxScoreTable};
use hoopgrade_core::config::{self, ModelConfig};
use hoopgrade_core::export;
use hoopgrade_core::ingest;
use hoopgrade_core::metrics::Metric;
use hoopgrade_core::pipeline::{self, EvaluationTable};
use hoopgrade_core::query::{self, ModelSummary};

/// Players printed at the end of a run.
const REPORT_TOP_N: usize = 10;

/// Summary as persisted: the model summary plus when it was produced.
#[derive(Debug, Serialize)]
struct PersistedSummary<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a ModelSummary,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("hoopgrade starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: pace {}, tiers {}/{}/{}/{}",
        config.metrics.league_pace,
        config.tiers.elite,
        config.tiers.starter,
        config.tiers.role_player,
        config.tiers.bench_player
    );

    let raw = load_input(&config)?;
    let cleaned = ingest::clean_table(&raw, &config.cleaning);

    let evaluated = pipeline::evaluate(&cleaned, &config);
    if evaluated.is_empty() {
        warn!("no players left to evaluate; nothing written");
        return Ok(());
    }

    export::write_evaluations(&evaluated, Path::new(&config.data_paths.output))
        .context("failed to write evaluation table")?;

    match query::summarize(&evaluated) {
        Some(summary) => {
            let persisted = PersistedSummary {
                generated_at: Utc::now(),
                summary: &summary,
            };
            export::write_summary(&persisted, Path::new(&config.data_paths.summary))
                .context("failed to write model summary")?;
            info!(
                "{} players evaluated, mean score {:.3}",
                summary.total_players, summary.strength_score_stats.mean
            );
        }
        None => warn!("empty evaluation; summary skipped"),
    }

    print_report(&evaluated);
    Ok(())
}

fn load_input(config: &ModelConfig) -> anyhow::Result<BoxScoreTable> {
    if config.data_paths.use_sample {
        info!("using built-in sample dataset");
        return Ok(sample_table());
    }
    let path = Path::new(&config.data_paths.input);
    ingest::load_box_scores(path)
        .with_context(|| format!("failed to load box scores from {}", path.display()))
}

fn print_report(table: &EvaluationTable) {
    println!("Player Strength Evaluation Results:");
    println!("{}", "=".repeat(72));
    println!(
        "{:<28} {:<4} {:>8}  {:<13} {:>7}",
        "player", "pos", "score", "tier", "per"
    );
    for row in query::top_players(table, REPORT_TOP_N, None) {
        println!(
            "{:<28} {:<4} {:>8.3}  {:<13} {:>7.3}",
            row.player(),
            row.position,
            row.strength_score,
            row.tier.label(),
            row.metric(Metric::Per).unwrap_or_default()
        );
    }
}

/// Initialize tracing to stderr so stdout carries only the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoopgrade=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
