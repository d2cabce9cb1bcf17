//! Применение сохранённой скоринговой системы к новым строкам лога

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::analytics::scoring::{RowScore, ScoringSystem};
use crate::error::{ParseError, ScoringError};
use crate::features::FeatureBuilder;
use crate::parser::LineParser;

pub const HIGH_SCORE: f64 = 0.7;
pub const LOW_SCORE: f64 = 0.3;

#[derive(Debug, Clone, Serialize)]
pub struct LineScore {
    pub line_number: usize,
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub score: RowScore,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoringSummary {
    pub total_lines: usize,
    pub valid_lines: usize,
    pub avg_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub avg_confidence: f64,
    pub high_score_lines: usize,
    pub low_score_lines: usize,
    pub top_lines: Vec<LineScore>,
}

impl ScoringSummary {
    pub fn from_scores(total_lines: usize, scores: &[LineScore], top_n: usize) -> Self {
        if scores.is_empty() {
            return ScoringSummary {
                total_lines,
                ..Default::default()
            };
        }

        let values: Vec<f64> = scores.iter().map(|s| s.score.score).collect();
        let n = values.len() as f64;

        let mut top: Vec<LineScore> = scores
            .iter()
            .filter(|s| s.score.score > 0.0)
            .cloned()
            .collect();
        top.sort_by(|a, b| b.score.score.total_cmp(&a.score.score));
        top.truncate(top_n);

        ScoringSummary {
            total_lines,
            valid_lines: scores.len(),
            avg_score: values.iter().sum::<f64>() / n,
            max_score: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_score: values.iter().copied().fold(f64::INFINITY, f64::min),
            avg_confidence: scores.iter().map(|s| s.score.confidence).sum::<f64>() / n,
            high_score_lines: values.iter().filter(|v| **v > HIGH_SCORE).count(),
            low_score_lines: values.iter().filter(|v| **v < LOW_SCORE).count(),
            top_lines: top,
        }
    }

    pub fn print(&self) {
        println!("\n🎯 Scoring summary:");
        println!("   Lines: {} (scored: {})", self.total_lines, self.valid_lines);
        println!(
            "   Score avg {:.3} | max {:.3} | min {:.3}",
            self.avg_score, self.max_score, self.min_score
        );
        println!("   Avg confidence: {:.3}", self.avg_confidence);
        println!(
            "   High (> {}): {} | Low (< {}): {}",
            HIGH_SCORE, self.high_score_lines, LOW_SCORE, self.low_score_lines
        );
        if !self.top_lines.is_empty() {
            println!("\n🏆 Top lines:");
            for line in &self.top_lines {
                println!(
                    "   line {:>6}  score {:.3}  confidence {:.2}  {}",
                    line.line_number + 1,
                    line.score.score,
                    line.score.confidence,
                    line.timestamp.as_deref().unwrap_or("-")
                );
            }
        }
    }
}

pub struct LogScorer {
    system: ScoringSystem,
    parser: LineParser,
}

impl LogScorer {
    pub fn new(system: ScoringSystem) -> Result<Self, ScoringError> {
        Ok(LogScorer {
            system,
            parser: LineParser::new()?,
        })
    }

    pub fn from_config(path: &Path) -> Result<Self, ScoringError> {
        let system = ScoringSystem::load(path)?;
        log::info!(
            "⚖️ Loaded scoring config {} ({} rules)",
            path.display(),
            system.rules.len()
        );
        Self::new(system)
    }

    pub fn system(&self) -> &ScoringSystem {
        &self.system
    }

    pub fn score_line(&self, line: &str, line_number: usize) -> Result<LineScore, ScoringError> {
        let record = self
            .parser
            .parse_line(line, line_number)
            .ok_or(ScoringError::UnparsableLine)?;
        let features = FeatureBuilder::build_row(&self.system.schema, &record);
        Ok(LineScore {
            line_number,
            timestamp: record.timestamp,
            score: self.system.score_row(&features, 0),
        })
    }

    /// Пропускает пустые, закомментированные и нераспознанные строки
    pub fn score_lines<'a>(&self, lines: impl Iterator<Item = &'a str>) -> (usize, Vec<LineScore>) {
        let mut total = 0;
        let mut scores = Vec::new();
        for (idx, line) in lines.enumerate() {
            total += 1;
            match self.score_line(line, idx) {
                Ok(score) => scores.push(score),
                Err(_) => log::debug!("Line {} not scored", idx + 1),
            }
        }
        (total, scores)
    }

    pub fn score_file(
        &self,
        path: &Path,
        top_n: usize,
    ) -> Result<(Vec<LineScore>, ScoringSummary), ScoringError> {
        let io_err = |source| {
            ScoringError::Parse(ParseError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>().map_err(io_err)?;

        let (total, scores) = self.score_lines(lines.iter().map(String::as_str));
        let summary = ScoringSummary::from_scores(total, &scores, top_n);
        log::info!(
            "✅ Scored {}/{} lines, average score {:.3}",
            summary.valid_lines,
            summary.total_lines,
            summary.avg_score
        );
        Ok((scores, summary))
    }
}
