//! Типы ошибок библиотеки
//! Каждый слой пайплайна имеет свой enum, бинарники оборачивают их в anyhow

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read log file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid numeric value: {0}")]
    InvalidValue(String),
    #[error("No valid records found in log")]
    NoRecords,
    #[error("Invalid parser pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Parsing step failed: {0}")]
    Parse(#[from] ParseError),
    #[error("Price field not found in feature matrix")]
    MissingPriceField,
    #[error("Not enough price data for event detection: {found} rows, need {required}")]
    InsufficientData { found: usize, required: usize },
    #[error("Feature matrix is empty")]
    EmptyFeatures,
    #[error("Report step failed: {0}")]
    Report(#[from] ReportError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Failed to load scoring config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid scoring config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Line could not be parsed")]
    UnparsableLine,
    #[error("Parser error: {0}")]
    Parse(#[from] ParseError),
}
