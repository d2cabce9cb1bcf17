//! Статистика по каждому признаку

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::{ColumnData, FeatureMatrix};
use crate::stats::{find_quantile, mean, min_max, sorted, std_dev};

const PERCENTILES: [(&str, f64); 7] = [
    ("p10", 0.10),
    ("p25", 0.25),
    ("p50", 0.50),
    ("p75", 0.75),
    ("p90", 0.90),
    ("p95", 0.95),
    ("p99", 0.99),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Numeric,
    Categorical,
}

impl FieldType {
    pub fn of(name: &str) -> Self {
        if name.contains("signal") {
            FieldType::Categorical
        } else {
            FieldType::Numeric
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldStatistics {
    pub field_type: FieldType,
    pub total_observations: usize,
    pub non_zero_observations: usize,
    pub activation_rate: f64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_counts: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_frequent: Option<String>,
}

fn numeric_summary(values: &[f64]) -> NumericSummary {
    let sorted = sorted(values);
    let (min, max) = min_max(values);
    NumericSummary {
        mean: mean(values),
        std: std_dev(values),
        min,
        max,
        percentiles: PERCENTILES
            .iter()
            .map(|(name, q)| (name.to_string(), find_quantile(&sorted, *q)))
            .collect(),
    }
}

/// Статистика по колонкам, где строк не меньше `min_samples`
pub fn compute_field_statistics(
    features: &FeatureMatrix,
    min_samples: usize,
) -> BTreeMap<String, FieldStatistics> {
    let mut result = BTreeMap::new();
    if features.rows() < min_samples {
        log::warn!(
            "⚠️ Only {} rows, field statistics need at least {}",
            features.rows(),
            min_samples
        );
        return result;
    }

    for column in features.columns() {
        let total = column.data.len();
        let stats = match &column.data {
            ColumnData::Numeric(values) => {
                let non_zero = values.iter().filter(|v| **v != 0.0).count();
                FieldStatistics {
                    field_type: FieldType::of(&column.name),
                    total_observations: total,
                    non_zero_observations: non_zero,
                    activation_rate: non_zero as f64 / total.max(1) as f64,
                    numeric: Some(numeric_summary(values)),
                    value_counts: None,
                    most_frequent: None,
                }
            }
            ColumnData::Categorical(values) => {
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                for value in values.iter().flatten() {
                    *counts.entry(value.clone()).or_insert(0) += 1;
                }
                let non_zero = counts.values().sum::<usize>();
                let most_frequent = counts
                    .iter()
                    .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                    .map(|(k, _)| k.clone());
                FieldStatistics {
                    field_type: FieldType::Categorical,
                    total_observations: total,
                    non_zero_observations: non_zero,
                    activation_rate: non_zero as f64 / total.max(1) as f64,
                    numeric: None,
                    value_counts: Some(counts),
                    most_frequent,
                }
            }
        };
        result.insert(column.name.clone(), stats);
    }

    log::info!("📈 Field statistics computed for {} fields", result.len());
    result
}
