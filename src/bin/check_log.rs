//! Проверка формата лога и качества данных перед анализом

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dslog_analytics::logging::init_logging;
use dslog_analytics::parser::{LogParser, analyze_data_quality, validate_log_format};

#[derive(Parser)]
#[command(name = "check-log", about = "Validate log format and report data quality")]
struct Args {
    /// Path to the log file
    #[arg(short, long)]
    log_file: PathBuf,

    /// Also parse the whole file and report parsing quality
    #[arg(long)]
    parse: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let validation = validate_log_format(&args.log_file)?;
    validation.print();
    if !validation.file_exists || !validation.readable {
        return Ok(());
    }

    let quality = analyze_data_quality(&args.log_file)
        .with_context(|| format!("Failed to analyze {}", args.log_file.display()))?;
    quality.print();

    if args.parse {
        let dataset = LogParser::new()?.parse_file(&args.log_file)?;
        dataset.parsing_statistics().print();

        let parsing = dataset.validate_parsing_quality();
        println!(
            "\n🧪 Parsing quality: {:.0}% ({:?})",
            parsing.score * 100.0,
            parsing.level
        );
        if !parsing.missing.is_empty() {
            println!("   Missing critical fields: {}", parsing.missing.join(", "));
        }
    }

    Ok(())
}
