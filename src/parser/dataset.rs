//! Набор распарсенных записей и статистика парсинга

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::parser::fields::{
    CRITICAL_FIELDS, FieldTag, INDICATOR_GROUPS, METADATA_FIELDS, Timeframe, field_order_key,
    group_of, split_field_name,
};
use crate::parser::line::LogRecord;

#[derive(Debug, Clone, Default)]
pub struct LogDataset {
    pub records: Vec<LogRecord>,
    pub total_lines: usize,
    pub skipped_lines: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeframeSplit {
    pub ltf: Vec<String>,
    pub htf: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsingStatistics {
    pub total_records: usize,
    pub skipped_lines: usize,
    pub indicator_fields: usize,
    pub group_counts: BTreeMap<String, usize>,
    pub metadata_fields: usize,
    pub ltf_fields: usize,
    pub htf_fields: usize,
    pub special_fields: usize,
    pub progress_fields: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Excellent,
    Good,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsingQuality {
    pub found: Vec<String>,
    pub missing: Vec<String>,
    pub score: f64,
    pub level: QualityLevel,
}

impl LogDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Все имена полей индикаторов в порядке групп
    pub fn field_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.records.iter().flat_map(|r| r.fields.keys()).collect();
        let mut names: Vec<String> = names.into_iter().cloned().collect();
        names.sort_by_key(|n| field_order_key(n));
        names
    }

    fn field_tag(&self, name: &str) -> Option<FieldTag> {
        self.records
            .iter()
            .find_map(|r| r.fields.get(name).map(|f| f.tag))
    }

    fn field_has_value(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.fields.contains_key(name))
    }

    /// Разделение полей на LTF и HTF
    pub fn ltf_htf_separation(&self) -> TimeframeSplit {
        let mut split = TimeframeSplit::default();
        for name in self.field_names() {
            let timeframe = self.field_tag(&name).map(FieldTag::timeframe).or_else(|| {
                let (_, suffix) = split_field_name(&name);
                Timeframe::from_suffix(suffix)
            });
            match timeframe {
                Some(Timeframe::Htf) => split.htf.push(name),
                Some(Timeframe::Ltf) => split.ltf.push(name),
                None => {}
            }
        }
        split
    }

    pub fn parsing_statistics(&self) -> ParsingStatistics {
        let names = self.field_names();
        let mut group_counts: BTreeMap<String, usize> = INDICATOR_GROUPS
            .iter()
            .map(|(group, _)| (group.to_string(), 0))
            .collect();

        let mut special_fields = 0;
        for name in &names {
            let (prefix, _) = split_field_name(name);
            if let Some((_, group)) = group_of(prefix) {
                *group_counts.entry(group.to_string()).or_insert(0) += 1;
            }
            if self.field_tag(name) == Some(FieldTag::HtfSpecial) {
                special_fields += 1;
            }
        }

        let metadata_fields = METADATA_FIELDS
            .iter()
            .filter(|m| self.records.iter().any(|r| r.candle.get(m).is_some()))
            .count();

        let progress_fields = self
            .records
            .iter()
            .flat_map(|r| r.progress.keys())
            .collect::<BTreeSet<_>>()
            .len();

        let split = self.ltf_htf_separation();
        let mut warnings = Vec::new();
        if split.htf.is_empty() {
            warnings.push("No HTF fields found".to_string());
        }
        if metadata_fields < 4 {
            warnings.push(format!("Only {} metadata fields found", metadata_fields));
        }

        ParsingStatistics {
            total_records: self.records.len(),
            skipped_lines: self.skipped_lines,
            indicator_fields: names.len(),
            group_counts,
            metadata_fields,
            ltf_fields: split.ltf.len(),
            htf_fields: split.htf.len(),
            special_fields,
            progress_fields,
            warnings,
        }
    }

    /// Оценка качества по критическим полям
    pub fn validate_parsing_quality(&self) -> ParsingQuality {
        let (found, missing): (Vec<&str>, Vec<&str>) = CRITICAL_FIELDS
            .iter()
            .partition(|name| self.field_has_value(name));

        let score = found.len() as f64 / CRITICAL_FIELDS.len() as f64;
        let level = if score >= 0.8 {
            QualityLevel::Excellent
        } else if score >= 0.6 {
            QualityLevel::Good
        } else {
            QualityLevel::Low
        };

        ParsingQuality {
            found: found.into_iter().map(String::from).collect(),
            missing: missing.into_iter().map(String::from).collect(),
            score,
            level,
        }
    }
}

impl ParsingStatistics {
    pub fn print(&self) {
        println!("\n📋 Parsing statistics:");
        println!("   Records: {} (skipped lines: {})", self.total_records, self.skipped_lines);
        println!("   Indicator fields: {}", self.indicator_fields);
        for (group, count) in &self.group_counts {
            println!("     {}: {}", group, count);
        }
        println!("   Metadata fields: {}", self.metadata_fields);
        println!("   LTF: {} | HTF: {} | special: {}", self.ltf_fields, self.htf_fields, self.special_fields);
        println!("   Progress fields: {}", self.progress_fields);
        for warning in &self.warnings {
            println!("   ⚠️ {}", warning);
        }
    }
}
