//! Проверка формата лога и анализ качества данных

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use serde::Serialize;

use crate::error::ParseError;
use crate::parser::LogParser;

const VALIDATION_SAMPLE: usize = 100;
const IRREGULAR_INTERVAL_SECS: f64 = 120.0;
const GAP_INTERVAL_SECS: f64 = 300.0;

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatValidation {
    pub file_exists: bool,
    pub readable: bool,
    pub correct_format: bool,
    pub line_count: usize,
    pub valid_lines: usize,
    pub timestamp_format: bool,
    pub required_fields: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemporalAnalysis {
    pub time_span_hours: f64,
    pub avg_interval_secs: f64,
    pub irregular_intervals: usize,
    pub data_gaps: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DataQualityReport {
    pub file_size: u64,
    pub total_lines: usize,
    pub valid_lines: usize,
    pub valid_ratio: f64,
    pub unique_fields: usize,
    pub avg_fields_per_line: f64,
    /// число полей в строке -> количество строк
    pub field_distribution: BTreeMap<usize, usize>,
    pub temporal: Option<TemporalAnalysis>,
    pub recommendations: Vec<String>,
}

/// Разбор метки времени: RFC 3339 или `%Y-%m-%d %H:%M:%S`
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

fn timestamp_regex() -> Result<Regex, ParseError> {
    Ok(Regex::new(r"^\[([^\]]+)\]:")?)
}

/// Валидация формата по первым строкам файла
pub fn validate_log_format(path: &Path) -> Result<FormatValidation, ParseError> {
    let mut result = FormatValidation::default();

    if !path.exists() {
        result.errors.push("File not found".to_string());
        return Ok(result);
    }
    result.file_exists = true;

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            result.errors.push(format!("Failed to read file: {}", e));
            return Ok(result);
        }
    };
    result.readable = true;
    result.line_count = content.lines().count();

    let ts_re = timestamp_regex()?;
    let sample = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(VALIDATION_SAMPLE);
    for line in sample {
        if let Some(caps) = ts_re.captures(line) {
            if parse_timestamp(&caps[1]).is_some() {
                result.timestamp_format = true;
            }
        }

        if line.contains("LTF|") || line.contains("HTF|") {
            if line.split('|').count() >= 6 {
                result.valid_lines += 1;
                if ["o:", "h:", "l:", "c:"].iter().all(|m| line.contains(m)) {
                    result.required_fields = true;
                }
            }
        }
    }

    if result.valid_lines == 0 {
        result.errors.push("No lines in LTF/HTF format".to_string());
    }
    if !result.timestamp_format {
        result.errors.push("Timestamp format not recognized".to_string());
    }
    if !result.required_fields {
        result.errors.push("OHLC fields (o:, h:, l:, c:) not found".to_string());
    }
    result.correct_format = result.valid_lines > 0 && result.timestamp_format && result.required_fields;

    Ok(result)
}

/// Анализ качества данных всего файла
pub fn analyze_data_quality(path: &Path) -> Result<DataQualityReport, ParseError> {
    let io_err = |source| ParseError::Io {
        path: path.display().to_string(),
        source,
    };
    let file_size = fs::metadata(path).map_err(io_err)?.len();
    let content = fs::read_to_string(path).map_err(io_err)?;

    let parser = LogParser::new()?;
    let ts_re = timestamp_regex()?;

    let mut report = DataQualityReport {
        file_size,
        total_lines: content.lines().count(),
        ..Default::default()
    };

    let mut timestamps = Vec::new();
    let mut all_fields = BTreeSet::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || !line.starts_with('[') {
            continue;
        }
        report.valid_lines += 1;

        if let Some(ts) = ts_re.captures(line).and_then(|c| parse_timestamp(&c[1])) {
            timestamps.push(ts);
        }

        let field_count = match parser.line_parser().parse_line(line, idx) {
            Some(record) => {
                let count = record.fields.len() + record.progress.len();
                all_fields.extend(record.fields.into_keys());
                all_fields.extend(record.progress.into_keys());
                count
            }
            None => 0,
        };
        *report.field_distribution.entry(field_count).or_insert(0) += 1;
    }

    report.valid_ratio = if report.total_lines > 0 {
        report.valid_lines as f64 / report.total_lines as f64
    } else {
        0.0
    };
    report.unique_fields = all_fields.len();
    if report.valid_lines > 0 {
        let total_fields: usize = report
            .field_distribution
            .iter()
            .map(|(fields, lines)| fields * lines)
            .sum();
        report.avg_fields_per_line = total_fields as f64 / report.valid_lines as f64;
    }

    if !timestamps.is_empty() {
        timestamps.sort();
        let diffs: Vec<f64> = timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0)
            .collect();
        let span = (timestamps[timestamps.len() - 1] - timestamps[0]).num_seconds() as f64;
        report.temporal = Some(TemporalAnalysis {
            time_span_hours: span / 3600.0,
            avg_interval_secs: if diffs.is_empty() {
                0.0
            } else {
                diffs.iter().sum::<f64>() / diffs.len() as f64
            },
            irregular_intervals: diffs.iter().filter(|d| **d > IRREGULAR_INTERVAL_SECS).count(),
            data_gaps: diffs.iter().filter(|d| **d > GAP_INTERVAL_SECS).count(),
        });
    }

    if report.valid_ratio < 0.8 {
        report
            .recommendations
            .push("Low share of valid lines, data cleanup recommended".to_string());
    }
    if report.temporal.as_ref().is_some_and(|t| t.data_gaps > 5) {
        report
            .recommendations
            .push("Significant time gaps detected".to_string());
    }
    if report.unique_fields < 10 {
        report
            .recommendations
            .push("Few unique fields, parsing problems are possible".to_string());
    }
    if report.recommendations.is_empty() {
        report.recommendations.push("Data quality is good".to_string());
    }

    Ok(report)
}

impl FormatValidation {
    pub fn print(&self) {
        println!("\n🔍 Format validation:");
        println!("   Lines: {} (valid in sample: {})", self.line_count, self.valid_lines);
        println!("   Timestamp format: {}", if self.timestamp_format { "✅" } else { "❌" });
        println!("   OHLC fields: {}", if self.required_fields { "✅" } else { "❌" });
        if self.correct_format {
            println!("   ✅ Format is correct");
        } else {
            for error in &self.errors {
                println!("   ❌ {}", error);
            }
        }
    }
}

impl DataQualityReport {
    pub fn print(&self) {
        println!("\n📊 Data quality:");
        println!("   File size: {} bytes", self.file_size);
        println!(
            "   Valid lines: {}/{} ({:.1}%)",
            self.valid_lines,
            self.total_lines,
            self.valid_ratio * 100.0
        );
        println!("   Unique fields: {}", self.unique_fields);
        println!("   Avg fields per line: {:.1}", self.avg_fields_per_line);
        if let Some(t) = &self.temporal {
            println!("   Time span: {:.2} h, avg interval {:.1} s", t.time_span_hours, t.avg_interval_secs);
            println!("   Irregular intervals: {}, gaps: {}", t.irregular_intervals, t.data_gaps);
        }
        println!("\n💡 Recommendations:");
        for rec in &self.recommendations {
            println!("   • {}", rec);
        }
    }
}
