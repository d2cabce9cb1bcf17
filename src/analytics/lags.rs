//! Временные лаги: за сколько баров до события активируется поле

use std::collections::BTreeMap;

use serde::Serialize;

use crate::features::FeatureMatrix;
use crate::stats::{mean, median, min_max, population_std, quantile};

pub const MIN_EVENTS: usize = 5;
const MIN_ACTIVATIONS: usize = 3;
const MIN_LAGS: usize = 3;
const MIN_ROWS: usize = 10;
const ACTIVATION_QUANTILE: f64 = 0.8;

#[derive(Debug, Clone, Serialize)]
pub struct LagStats {
    pub mean_lag: f64,
    pub median_lag: f64,
    pub std_lag: f64,
    pub min_lag: usize,
    pub max_lag: usize,
    pub samples: usize,
    pub predictive_power: f64,
}

/// Для каждого события берётся ближайшая активация строго до него, не дальше `max_lag`
pub fn event_lags(activations: &[usize], event_indices: &[usize], max_lag: usize) -> Vec<usize> {
    event_indices
        .iter()
        .filter_map(|&event| {
            activations
                .iter()
                .copied()
                .filter(|&a| a < event && event - a <= max_lag)
                .max()
                .map(|closest| event - closest)
        })
        .collect()
}

fn lag_stats(lags: &[usize], total_events: usize) -> LagStats {
    let values: Vec<f64> = lags.iter().map(|&l| l as f64).collect();
    let (min, max) = min_max(&values);
    LagStats {
        mean_lag: mean(&values),
        median_lag: median(&values),
        std_lag: population_std(&values),
        min_lag: min as usize,
        max_lag: max as usize,
        samples: lags.len(),
        predictive_power: lags.len() as f64 / total_events.max(1) as f64,
    }
}

pub fn analyze_temporal_lags(
    features: &FeatureMatrix,
    events: &[bool],
    max_lag: usize,
) -> BTreeMap<String, LagStats> {
    let mut result = BTreeMap::new();

    let event_indices: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| **e)
        .map(|(i, _)| i)
        .collect();
    if event_indices.len() < MIN_EVENTS {
        log::warn!(
            "⚠️ Only {} events, temporal lag analysis needs at least {}",
            event_indices.len(),
            MIN_EVENTS
        );
        return result;
    }

    let mut candidates: Vec<(String, Vec<usize>)> = Vec::new();

    for (name, values) in features.numeric_columns() {
        if values.len() < MIN_ROWS {
            continue;
        }
        let threshold = quantile(values, ACTIVATION_QUANTILE);
        let activations = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > threshold)
            .map(|(i, _)| i)
            .collect();
        candidates.push((name.to_string(), activations));
    }

    for (name, values) in features.categorical_columns() {
        if !name.ends_with("_signal") {
            continue;
        }
        let activations = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| i)
            .collect();
        candidates.push((name.to_string(), activations));
    }

    for (name, activations) in candidates {
        if activations.len() < MIN_ACTIVATIONS {
            continue;
        }
        let lags = event_lags(&activations, &event_indices, max_lag);
        if lags.len() >= MIN_LAGS {
            result.insert(name, lag_stats(&lags, event_indices.len()));
        }
    }

    log::info!("⏱️ Temporal lags found for {} fields", result.len());
    result
}

/// Поля с наибольшей предсказательной силой
pub fn top_lags(lags: &BTreeMap<String, LagStats>, limit: usize) -> Vec<(&str, &LagStats)> {
    let mut ranked: Vec<(&str, &LagStats)> = lags.iter().map(|(k, v)| (k.as_str(), v)).collect();
    ranked.sort_by(|a, b| b.1.predictive_power.total_cmp(&a.1.predictive_power));
    ranked.truncate(limit);
    ranked
}
