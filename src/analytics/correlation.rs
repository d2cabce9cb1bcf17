//! Корреляции признаков с событиями
//! Числовые поля: Пирсон + подбор порога по ROC-AUC. Сигнальные поля: эффективность и хи-квадрат.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::features::FeatureMatrix;
use crate::stats::{
    chi_square_2x2, contingency_2x2, count_unique, find_quantile, point_biserial, roc_auc, sorted,
    spearman,
};

pub const ROC_QUANTILES: [f64; 5] = [0.5, 0.7, 0.8, 0.9, 0.95];

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdRoc {
    pub quantile: f64,
    pub threshold: f64,
    pub roc_auc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericCorrelation {
    pub pearson_r: f64,
    pub p_value: f64,
    pub significant: bool,
    pub spearman_r: f64,
    pub best_roc_auc: Option<f64>,
    pub best_threshold: Option<f64>,
    pub activation_rate: Option<f64>,
    pub thresholds: Vec<ThresholdRoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalStats {
    pub effectiveness: f64,
    pub frequency: f64,
    pub count: usize,
    pub events_when_signal: usize,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalCorrelation {
    pub signals: BTreeMap<String, SignalStats>,
    pub best_signal: Option<String>,
    pub best_effectiveness: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "field_type", rename_all = "lowercase")]
pub enum FieldCorrelation {
    Numeric(NumericCorrelation),
    Categorical(SignalCorrelation),
}

impl FieldCorrelation {
    pub fn as_numeric(&self) -> Option<&NumericCorrelation> {
        match self {
            FieldCorrelation::Numeric(n) => Some(n),
            FieldCorrelation::Categorical(_) => None,
        }
    }

    pub fn is_significant(&self) -> bool {
        match self {
            FieldCorrelation::Numeric(n) => n.significant,
            FieldCorrelation::Categorical(c) => c.signals.values().any(|s| s.significant),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationReport {
    pub fields: BTreeMap<String, FieldCorrelation>,
}

impl CorrelationReport {
    pub fn total(&self) -> usize {
        self.fields.len()
    }

    pub fn significant_count(&self) -> usize {
        self.fields.values().filter(|f| f.is_significant()).count()
    }

    /// Числовые поля с ROC-AUC выше `min_roc`, по убыванию
    pub fn top_by_roc(&self, min_roc: f64, limit: usize) -> Vec<(&str, &NumericCorrelation)> {
        let mut ranked: Vec<(&str, &NumericCorrelation)> = self
            .fields
            .iter()
            .filter_map(|(name, f)| f.as_numeric().map(|n| (name.as_str(), n)))
            .filter(|(_, n)| n.best_roc_auc.is_some_and(|roc| roc > min_roc))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.best_roc_auc
                .unwrap_or(0.0)
                .total_cmp(&a.1.best_roc_auc.unwrap_or(0.0))
        });
        ranked.truncate(limit);
        ranked
    }

    pub fn roc_values(&self) -> Vec<f64> {
        self.fields
            .values()
            .filter_map(|f| f.as_numeric().and_then(|n| n.best_roc_auc))
            .collect()
    }
}

fn analyze_numeric(values: &[f64], events: &[bool], significance: f64) -> NumericCorrelation {
    let pearson = point_biserial(values, events);
    let event_values: Vec<f64> = events.iter().map(|&e| if e { 1.0 } else { 0.0 }).collect();
    let spearman_r = spearman(values, &event_values).r;

    let mut result = NumericCorrelation {
        pearson_r: pearson.r,
        p_value: pearson.p_value,
        significant: pearson.p_value < significance,
        spearman_r,
        best_roc_auc: None,
        best_threshold: None,
        activation_rate: None,
        thresholds: Vec::new(),
    };

    if count_unique(values) <= 1 {
        return result;
    }

    let sorted_values = sorted(values);
    let mut best_roc = 0.5;
    for q in ROC_QUANTILES {
        let threshold = find_quantile(&sorted_values, q);
        let predicted: Vec<f64> = values
            .iter()
            .map(|&v| if v > threshold { 1.0 } else { 0.0 })
            .collect();
        let active = predicted.iter().filter(|p| **p > 0.0).count();
        if active == 0 || active == predicted.len() {
            continue;
        }
        let Some(roc) = roc_auc(&predicted, events) else {
            continue;
        };

        result.thresholds.push(ThresholdRoc {
            quantile: q,
            threshold,
            roc_auc: roc,
        });
        if roc > best_roc {
            best_roc = roc;
            result.best_roc_auc = Some(roc);
            result.best_threshold = Some(threshold);
            result.activation_rate = Some(active as f64 / predicted.len() as f64);
        }
    }

    result
}

fn analyze_signals(values: &[Option<String>], events: &[bool], significance: f64) -> SignalCorrelation {
    let unique: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
    let n = values.len().max(1) as f64;

    let mut signals = BTreeMap::new();
    for signal in unique {
        let present: Vec<bool> = values
            .iter()
            .map(|v| v.as_deref() == Some(signal))
            .collect();
        let count = present.iter().filter(|p| **p).count();
        if count == 0 {
            continue;
        }
        let events_when_signal = present
            .iter()
            .zip(events)
            .filter(|(p, e)| **p && **e)
            .count();

        let test = chi_square_2x2(contingency_2x2(&present, events));
        signals.insert(
            signal.to_string(),
            SignalStats {
                effectiveness: events_when_signal as f64 / count as f64,
                frequency: count as f64 / n,
                count,
                events_when_signal,
                p_value: test.p_value,
                significant: test.p_value < significance,
            },
        );
    }

    let best = signals
        .iter()
        .max_by(|a, b| a.1.effectiveness.total_cmp(&b.1.effectiveness));
    SignalCorrelation {
        best_signal: best.map(|(name, _)| name.clone()),
        best_effectiveness: best.map(|(_, s)| s.effectiveness).unwrap_or(0.0),
        signals,
    }
}

/// Корреляция каждого признака с маской событий
pub fn analyze_correlations(
    features: &FeatureMatrix,
    events: &[bool],
    significance: f64,
) -> CorrelationReport {
    let mut report = CorrelationReport::default();

    for (name, values) in features.numeric_columns() {
        let result = analyze_numeric(values, events, significance);
        report
            .fields
            .insert(name.to_string(), FieldCorrelation::Numeric(result));
    }

    for (name, values) in features.categorical_columns() {
        if !name.ends_with("_signal") {
            continue;
        }
        let result = analyze_signals(values, events, significance);
        report
            .fields
            .insert(name.to_string(), FieldCorrelation::Categorical(result));
    }

    log::info!(
        "🔗 Correlations: {} fields, {} significant",
        report.total(),
        report.significant_count()
    );
    report
}
