//! Валидация скоринговой системы на отложенной выборке
//! Стратифицированное разбиение с фиксированным seed.
//! Корреляции, VETO, веса и порог подбираются только на обучающей части.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::analytics::scoring::ScoringSystem;
use crate::config::ValidationConfig;
use crate::features::FeatureMatrix;
use crate::stats::{ConfusionCounts, roc_auc};

pub const MIN_VALIDATION_ROWS: usize = 20;
const MIN_LIFT_BASE: f64 = 0.01;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub method: String,
    pub roc_auc: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub event_rate: f64,
    pub lift: f64,
    pub decision_threshold: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub features_used: usize,
    pub feature_importances: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ValidationResult {
    pub fn print(&self) {
        println!("\n✅ Validation ({}):", self.method);
        println!("   ROC-AUC:   {:.3}", self.roc_auc);
        println!("   Accuracy:  {:.3}", self.accuracy);
        println!("   Precision: {:.3}", self.precision);
        println!("   Recall:    {:.3}", self.recall);
        println!("   Lift:      {:.2}x (event rate {:.2}%)", self.lift, self.event_rate * 100.0);
        println!("   Features used: {}", self.features_used);
        if let Some(note) = &self.note {
            println!("   ⚠️ {}", note);
        }
    }
}

/// Стратифицированное разбиение индексов: (train, test)
pub fn stratified_split(labels: &[bool], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [true, false] {
        let mut idx: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        idx.shuffle(&mut rng);

        let mut n_test = (idx.len() as f64 * test_fraction).round() as usize;
        if idx.len() >= 2 {
            n_test = n_test.clamp(1, idx.len() - 1);
        }
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Порог с максимальным J = TPR - FPR
pub fn best_threshold(scores: &[f64], labels: &[bool]) -> f64 {
    let mut candidates: Vec<f64> = scores.to_vec();
    candidates.sort_by(f64::total_cmp);
    candidates.dedup();

    let mut best = (f64::NEG_INFINITY, f64::INFINITY);
    for &threshold in &candidates {
        let predicted: Vec<bool> = scores.iter().map(|&s| s >= threshold).collect();
        let counts = ConfusionCounts::from_predictions(&predicted, labels);
        let j = counts.recall() - counts.false_positive_rate();
        if j > best.0 {
            best = (j, threshold);
        }
    }
    if best.1.is_finite() { best.1 } else { 0.0 }
}

fn pick<T: Copy>(data: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| data[i]).collect()
}

/// Валидация с переобучением: `fit` строит скоринговую систему только по обучающим строкам,
/// отложенные строки участвуют лишь в расчёте метрик.
pub fn validate<F>(
    features: &FeatureMatrix,
    events: &[bool],
    config: &ValidationConfig,
    fit: F,
) -> ValidationResult
where
    F: FnOnce(&FeatureMatrix, &[bool]) -> ScoringSystem,
{
    let positives = events.iter().filter(|e| **e).count();
    let negatives = events.len() - positives;

    let holdout = events.len() >= MIN_VALIDATION_ROWS && positives >= 2 && negatives >= 2;
    let (train, test, method, note) = if holdout {
        let (train, test) = stratified_split(events, config.test_fraction, config.seed);
        (train, test, "stratified_holdout", None)
    } else {
        let all: Vec<usize> = (0..events.len()).collect();
        (
            all.clone(),
            all,
            "in_sample",
            Some("Not enough rows or events for a holdout split, metrics are in-sample".to_string()),
        )
    };

    let train_features = features.select_rows(&train);
    let train_labels = pick(events, &train);
    let system = fit(&train_features, &train_labels);
    log::debug!(
        "Validation system fitted on {} rows: {} rules",
        train.len(),
        system.rules.len()
    );

    let threshold = best_threshold(&system.raw_scores(&train_features), &train_labels);
    let test_scores = system.raw_scores(&features.select_rows(&test));
    let test_labels = pick(events, &test);
    let predicted: Vec<bool> = test_scores.iter().map(|&s| s >= threshold).collect();
    let counts = ConfusionCounts::from_predictions(&predicted, &test_labels);

    let event_rate = if test_labels.is_empty() {
        0.0
    } else {
        test_labels.iter().filter(|l| **l).count() as f64 / test_labels.len() as f64
    };
    let precision = counts.precision();

    let result = ValidationResult {
        method: method.to_string(),
        roc_auc: roc_auc(&test_scores, &test_labels).unwrap_or(0.5),
        accuracy: counts.accuracy(),
        precision,
        recall: counts.recall(),
        event_rate,
        lift: precision / event_rate.max(MIN_LIFT_BASE),
        decision_threshold: threshold,
        train_rows: train.len(),
        test_rows: test.len(),
        features_used: system.rules.len(),
        feature_importances: system
            .rules
            .iter()
            .map(|r| (r.feature.clone(), r.weight))
            .collect(),
        note,
    };

    log::info!(
        "🧪 Validation: ROC-AUC {:.3}, precision {:.3}, recall {:.3}",
        result.roc_auc,
        result.precision,
        result.recall
    );
    result
}
