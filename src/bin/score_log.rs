//! Скоринг строк лога по сохранённой конфигурации

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dslog_analytics::logging::init_logging;
use dslog_analytics::report::write_json;
use dslog_analytics::scoring_api::LogScorer;

#[derive(Parser)]
#[command(name = "score-log", about = "Score indicator log lines with an exported scoring config")]
struct Args {
    /// Scoring config produced by analyze_log
    #[arg(short, long, default_value = "results/scoring_config.json")]
    config: PathBuf,

    /// Log file to score
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Score a single line instead of a file
    #[arg(long)]
    line: Option<String>,

    /// Number of top lines in the summary
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Save per-line scores as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let scorer = LogScorer::from_config(&args.config)
        .with_context(|| format!("Failed to load scoring config {}", args.config.display()))?;

    if let Some(line) = &args.line {
        let result = scorer.score_line(line, 0).context("Failed to score line")?;
        println!("🎯 Score:      {:.3}", result.score.score);
        println!("   Raw score:  {:+.4}", result.score.raw_score);
        println!("   Confidence: {:.3}", result.score.confidence);
        println!("   Active:     {} (veto: {})", result.score.active_features, result.score.veto_triggered);
        for (feature, weight) in &result.score.contributions {
            println!("     {:<40} {:+.4}", feature, weight);
        }
        return Ok(());
    }

    let Some(log_file) = &args.log_file else {
        bail!("either --log-file or --line is required");
    };

    let (scores, summary) = scorer.score_file(log_file, args.top)?;
    summary.print();

    if let Some(output) = &args.output {
        write_json(output, &scores).context("Failed to save scores")?;
        println!("\n💾 Scores saved to: {}", output.display());
    }

    Ok(())
}
