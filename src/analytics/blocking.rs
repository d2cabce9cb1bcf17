//! Поля-блокираторы
//! Поле блокирует, если при его активации падает точность базового сигнала

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::VetoConfig;
use crate::features::FeatureMatrix;
use crate::stats::{find_quantile, sorted, std_dev};

pub const ACTIVATION_PERCENTILES: [f64; 4] = [0.7, 0.8, 0.9, 0.95];
const MIN_ACTIVATIONS: usize = 10;
const MIN_OTHER_FIELDS: usize = 5;
const BASELINE_FIELDS: usize = 10;
const BASELINE_QUANTILE: f64 = 0.8;
const MIN_FIELD_STD: f64 = 0.01;
const BASELINE_SEED: u64 = 42;

#[derive(Debug, Clone, Serialize)]
pub struct BlockingField {
    pub field: String,
    /// Порог по |значению|
    pub threshold: f64,
    /// Точность без активации минус точность при активации
    pub blocking_strength: f64,
    /// Ложные срабатывания базового сигнала среди активаций поля
    pub false_positive_rate: f64,
    pub accuracy_without_field: f64,
    pub accuracy_with_field: f64,
    pub activations: usize,
}

fn accuracy(predicted: &[bool], actual: &[bool]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    correct as f64 / predicted.len() as f64
}

/// Базовый сигнал: сумма |значений| случайной выборки других полей выше 80-го перцентиля
fn baseline_signal(features: &FeatureMatrix, exclude: &str) -> Option<Vec<bool>> {
    let others: Vec<&[f64]> = features
        .numeric_columns()
        .filter(|(name, _)| *name != exclude)
        .map(|(_, values)| values)
        .collect();
    if others.len() < MIN_OTHER_FIELDS {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(BASELINE_SEED);
    let sample: Vec<&&[f64]> = others
        .choose_multiple(&mut rng, BASELINE_FIELDS.min(others.len()))
        .collect();

    let activity: Vec<f64> = (0..features.rows())
        .map(|row| sample.iter().map(|values| values[row].abs()).sum())
        .collect();
    let cutoff = find_quantile(&sorted(&activity), BASELINE_QUANTILE);
    Some(activity.iter().map(|&a| a > cutoff).collect())
}

fn blocking_effect(active: &[bool], baseline: &[bool], events: &[bool]) -> Option<BlockingField> {
    let pick = |want: bool| -> (Vec<bool>, Vec<bool>) {
        active
            .iter()
            .zip(baseline.iter().zip(events))
            .filter(|(a, _)| **a == want)
            .map(|(_, (b, e))| (*b, *e))
            .unzip()
    };
    let (signal_on, events_on) = pick(true);
    let (signal_off, events_off) = pick(false);
    if signal_on.len() <= MIN_ACTIVATIONS || signal_off.len() <= MIN_ACTIVATIONS {
        return None;
    }

    let accuracy_with_field = accuracy(&signal_on, &events_on);
    let accuracy_without_field = accuracy(&signal_off, &events_off);
    let false_positives = signal_on
        .iter()
        .zip(&events_on)
        .filter(|(s, e)| **s && !**e)
        .count();

    Some(BlockingField {
        field: String::new(),
        threshold: 0.0,
        blocking_strength: (accuracy_without_field - accuracy_with_field).max(0.0),
        false_positive_rate: false_positives as f64 / signal_on.len() as f64,
        accuracy_without_field,
        accuracy_with_field,
        activations: signal_on.len(),
    })
}

/// Лучший порог активации поля по силе блокировки
pub fn analyze_blocker(
    features: &FeatureMatrix,
    field: &str,
    events: &[bool],
) -> Option<BlockingField> {
    let values = features.numeric(field)?;
    if std_dev(values) < MIN_FIELD_STD {
        return None;
    }
    let baseline = baseline_signal(features, field)?;
    let magnitudes = sorted(&values.iter().map(|v| v.abs()).collect::<Vec<_>>());

    let mut best: Option<BlockingField> = None;
    for percentile in ACTIVATION_PERCENTILES {
        let threshold = find_quantile(&magnitudes, percentile);
        let active: Vec<bool> = values.iter().map(|v| v.abs() > threshold).collect();
        if active.iter().filter(|a| **a).count() < MIN_ACTIVATIONS {
            continue;
        }
        let Some(mut effect) = blocking_effect(&active, &baseline, events) else {
            continue;
        };
        if best
            .as_ref()
            .is_none_or(|b| effect.blocking_strength > b.blocking_strength)
        {
            effect.field = field.to_string();
            effect.threshold = threshold;
            best = Some(effect);
        }
    }
    best
}

/// Поля-блокираторы, сильнейшие первыми
pub fn find_blocking_fields(
    features: &FeatureMatrix,
    events: &[bool],
    config: &VetoConfig,
) -> Vec<BlockingField> {
    if !events.iter().any(|e| *e) {
        return Vec::new();
    }

    let mut blockers: Vec<BlockingField> = features
        .numeric_columns()
        .filter_map(|(name, _)| analyze_blocker(features, name, events))
        .filter(|b| b.blocking_strength > config.min_blocking_strength)
        .collect();
    blockers.sort_by(|a, b| b.blocking_strength.total_cmp(&a.blocking_strength));
    blockers.truncate(config.max_blocking_fields);

    log::info!("🧱 Blocking fields found: {}", blockers.len());
    for blocker in blockers.iter().take(5) {
        log::debug!(
            "   {}: blocking {:.3}, false positives {:.1}%",
            blocker.field,
            blocker.blocking_strength,
            blocker.false_positive_rate * 100.0
        );
    }
    blockers
}
