//! Подготовка логов перед анализом: очистка, разбиение по событиям, объединение

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dslog_analytics::logging::init_logging;
use dslog_analytics::parser::{clean_log_file, merge_log_files, split_log_file};

#[derive(Parser)]
#[command(name = "log-tools", about = "Clean, split and merge indicator logs")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drop duplicates and foreign lines, normalize separators
    Clean {
        input: PathBuf,
        /// Defaults to <input>.cleaned.txt
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// One file per `LTF|<event>|` tag
    Split {
        input: PathBuf,
        /// Defaults to split_events/ next to the input
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Merge files ordered by timestamp without repeated lines
    Merge {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();

    match Args::parse().command {
        Command::Clean { input, output } => {
            let (path, stats) = clean_log_file(&input, output.as_deref())
                .with_context(|| format!("Failed to clean {}", input.display()))?;
            println!("🧹 Cleaned log saved to {}", path.display());
            println!("   Lines processed:    {}", stats.total_lines);
            println!("   Valid lines:        {}", stats.valid_lines);
            println!("   Duplicates removed: {}", stats.removed_duplicates);
        }
        Command::Split { input, output_dir } => {
            let files = split_log_file(&input, output_dir.as_deref())
                .with_context(|| format!("Failed to split {}", input.display()))?;
            println!("✂️ {} event files created", files.len());
        }
        Command::Merge { inputs, output } => {
            let stats = merge_log_files(&inputs, &output).context("Failed to merge logs")?;
            println!("🔗 Merged into {}", output.display());
            println!("   Total lines:        {}", stats.total_lines);
            println!("   Unique lines:       {}", stats.unique_lines);
            println!("   Duplicates removed: {}", stats.removed_duplicates);
        }
    }
    Ok(())
}
