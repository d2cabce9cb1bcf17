//! Парсинг логов индикаторов
//! Формат: `[timestamp]: LTF|event|...|RED|-1.79%|11.5K|BIG_BODY|66%|...|o:..|h:..|l:..|c:..|rng:..|p2-0,ef2--7.19,nw2-!!,...`

pub mod dataset;
pub mod fields;
pub mod line;
pub mod quality;
pub mod utils;
pub mod value;

pub use dataset::*;
pub use fields::{FieldTag, Timeframe};
pub use line::*;
pub use quality::*;
pub use utils::*;
pub use value::*;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ParseError;

pub struct LogParser {
    line_parser: LineParser,
}

impl LogParser {
    pub fn new() -> Result<Self, ParseError> {
        Ok(LogParser {
            line_parser: LineParser::new()?,
        })
    }

    pub fn line_parser(&self) -> &LineParser {
        &self.line_parser
    }

    /// Загрузить и распарсить файл лога
    pub fn parse_file(&self, path: &Path) -> Result<LogDataset, ParseError> {
        log::info!("📂 Parsing log file: {}", path.display());
        let io_err = |source| ParseError::Io {
            path: path.display().to_string(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let reader = BufReader::new(file);

        let mut dataset = LogDataset::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            self.consume_line(&mut dataset, &line, idx);
        }

        Self::finish(dataset)
    }

    pub fn parse_str(&self, text: &str) -> Result<LogDataset, ParseError> {
        let mut dataset = LogDataset::default();
        for (idx, line) in text.lines().enumerate() {
            self.consume_line(&mut dataset, line, idx);
        }
        Self::finish(dataset)
    }

    fn consume_line(&self, dataset: &mut LogDataset, line: &str, idx: usize) {
        dataset.total_lines += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return;
        }

        match self.line_parser.parse_line(trimmed, idx) {
            Some(record) => dataset.records.push(record),
            None => {
                dataset.skipped_lines += 1;
                log::warn!("⚠️ Line {} skipped: no recognizable data", idx + 1);
            }
        }

        if dataset.total_lines % 1000 == 0 {
            log::info!("   processed {} lines", dataset.total_lines);
        }
    }

    fn finish(dataset: LogDataset) -> Result<LogDataset, ParseError> {
        if dataset.is_empty() {
            return Err(ParseError::NoRecords);
        }
        log::info!(
            "✅ Parsed {} records ({} lines skipped)",
            dataset.len(),
            dataset.skipped_lines
        );
        Ok(dataset)
    }
}
