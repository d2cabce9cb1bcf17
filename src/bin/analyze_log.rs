//! Полный статистический анализ лога индикаторов
//! Результаты сохраняются в папку results (или указанную через --output)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dslog_analytics::analytics::LogAnalyzer;
use dslog_analytics::config::load_config;
use dslog_analytics::logging::init_logging;

#[derive(Parser)]
#[command(name = "analyze-log", about = "Data-driven statistical analysis of an indicator log")]
struct Args {
    /// Path to the log file
    #[arg(short, long)]
    log_file: PathBuf,

    /// YAML config, defaults are used when the file is missing
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Results directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip SVG charts
    #[arg(long)]
    no_charts: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = load_config(&args.config).context("Failed to load config")?;
    if let Some(output) = args.output {
        config.output.results_dir = output;
    }
    if args.no_charts {
        config.output.charts = false;
    }

    println!("📊 Analyzing log: {}\n", args.log_file.display());

    let analyzer = LogAnalyzer::new(config)?;
    let (results, outcome) = analyzer
        .run_full_analysis(&args.log_file)
        .with_context(|| format!("Analysis of {} failed", args.log_file.display()))?;

    results.print();

    println!("\n💾 Results saved to: {}", outcome.results_dir.display());
    for file in &outcome.files_created {
        println!("   - {}", file.display());
    }

    Ok(())
}
