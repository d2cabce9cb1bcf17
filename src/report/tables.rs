//! JSON и CSV выгрузки результатов

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::analytics::AnalysisResults;
use crate::analytics::scoring::{RuleCondition, RuleKind};
use crate::error::ReportError;
use crate::stats::pearson_corr;

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct WeightRow<'a> {
    feature: &'a str,
    base_field: &'a str,
    field_type: RuleKind,
    weight: f64,
    weight_source: &'a str,
    roc_auc: Option<f64>,
}

pub fn write_weight_matrix(path: &Path, results: &AnalysisResults) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for rule in &results.scoring.rules {
        writer.serialize(WeightRow {
            feature: &rule.feature,
            base_field: &rule.base_field,
            field_type: rule.kind,
            weight: rule.weight,
            weight_source: &rule.weight_source,
            roc_auc: rule.roc_auc,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct TopFieldRow<'a> {
    rank: usize,
    field: &'a str,
    activated_field: &'a str,
    #[serde(rename = "type")]
    kind: RuleKind,
    weight: f64,
    abs_weight: f64,
    effectiveness: f64,
    p_value: Option<f64>,
    significant: bool,
}

pub fn write_top_fields(path: &Path, results: &AnalysisResults) -> Result<(), ReportError> {
    let mut rules: Vec<_> = results.scoring.rules.iter().collect();
    rules.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));

    let mut writer = csv::Writer::from_path(path)?;
    for (rank, rule) in rules.iter().enumerate() {
        let effectiveness = match rule.condition {
            RuleCondition::Above { .. } => rule.roc_auc.unwrap_or(0.5),
            _ => rule.effectiveness.unwrap_or(0.0),
        };
        writer.serialize(TopFieldRow {
            rank: rank + 1,
            field: &rule.base_field,
            activated_field: &rule.feature,
            kind: rule.kind,
            weight: rule.weight,
            abs_weight: rule.weight.abs(),
            effectiveness,
            p_value: rule.p_value,
            significant: rule.significant,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct VetoRow<'a> {
    veto: &'a str,
    field: &'a str,
    direction: &'a str,
    percentile: f64,
    threshold: f64,
    effectiveness: f64,
    activation_frequency: f64,
    anticorrelation: f64,
    p_value: f64,
    events_blocked: i64,
}

pub fn write_veto_effectiveness(path: &Path, results: &AnalysisResults) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for (name, veto) in &results.vetos {
        writer.serialize(VetoRow {
            veto: name,
            field: &veto.field,
            direction: veto.direction.suffix(),
            percentile: veto.percentile,
            threshold: veto.threshold,
            effectiveness: veto.effectiveness,
            activation_frequency: veto.activation_frequency,
            anticorrelation: veto.anticorrelation,
            p_value: veto.p_value,
            events_blocked: veto.events_blocked,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Матрица Пирсона между колонками индикаторов и метаданных
pub fn write_correlation_matrix(path: &Path, results: &AnalysisResults) -> Result<(), ReportError> {
    let columns: Vec<(&str, &[f64])> = results
        .features
        .numeric_columns()
        .filter(|(name, _)| name.ends_with("_ind") || name.starts_with("meta_"))
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["field"];
    header.extend(columns.iter().map(|(name, _)| *name));
    writer.write_record(&header)?;

    for (name, values) in &columns {
        let mut record = vec![name.to_string()];
        for (_, other) in &columns {
            record.push(format!("{:.4}", pearson_corr(values, other)));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
