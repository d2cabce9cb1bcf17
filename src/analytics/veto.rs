//! Поиск VETO полей: условия, при которых события происходят заметно реже

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::VetoConfig;
use crate::features::FeatureMatrix;
use crate::stats::{chi_square_2x2, contingency_2x2, find_quantile, pearson_corr, sorted};

pub const VETO_PERCENTILES: [f64; 6] = [0.1, 0.2, 0.3, 0.8, 0.9, 0.95];
const MIN_ACTIVATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VetoDirection {
    /// value <= threshold
    Low,
    /// value >= threshold
    High,
}

impl VetoDirection {
    pub fn for_percentile(percentile: f64) -> Self {
        if percentile <= 0.3 {
            VetoDirection::Low
        } else {
            VetoDirection::High
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            VetoDirection::Low => "low",
            VetoDirection::High => "high",
        }
    }

    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            VetoDirection::Low => value <= threshold,
            VetoDirection::High => value >= threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VetoField {
    pub field: String,
    pub direction: VetoDirection,
    pub percentile: f64,
    pub threshold: f64,
    pub effectiveness: f64,
    pub veto_event_rate: f64,
    pub normal_event_rate: f64,
    pub activation_frequency: f64,
    pub anticorrelation: f64,
    pub p_value: f64,
    pub significant: bool,
    pub events_blocked: i64,
}

fn evaluate(
    field: &str,
    values: &[f64],
    sorted_values: &[f64],
    events: &[bool],
    percentile: f64,
    significance: f64,
) -> Option<VetoField> {
    let direction = VetoDirection::for_percentile(percentile);
    let threshold = find_quantile(sorted_values, percentile);
    let condition: Vec<bool> = values.iter().map(|&v| direction.holds(v, threshold)).collect();

    let with_count = condition.iter().filter(|c| **c).count();
    let without_count = condition.len() - with_count;
    if with_count <= MIN_ACTIVATIONS || without_count == 0 {
        return None;
    }

    let events_with = condition.iter().zip(events).filter(|(c, e)| **c && **e).count();
    let events_without = condition.iter().zip(events).filter(|(c, e)| !**c && **e).count();

    let veto_rate = events_with as f64 / with_count as f64;
    let normal_rate = events_without as f64 / without_count as f64;
    if normal_rate <= 0.0 {
        return None;
    }

    let effectiveness = (normal_rate - veto_rate) / normal_rate;
    let activation_frequency = with_count as f64 / condition.len() as f64;
    let test = chi_square_2x2(contingency_2x2(&condition, events));

    let as_f64 = |flags: &[bool]| -> Vec<f64> {
        flags.iter().map(|&f| if f { 1.0 } else { 0.0 }).collect()
    };
    let anticorrelation = pearson_corr(&as_f64(&condition), &as_f64(events));

    Some(VetoField {
        field: field.to_string(),
        direction,
        percentile,
        threshold,
        effectiveness,
        veto_event_rate: veto_rate,
        normal_event_rate: normal_rate,
        activation_frequency,
        anticorrelation,
        p_value: test.p_value,
        significant: test.p_value < significance,
        events_blocked: ((events_without as f64 - events_with as f64) * activation_frequency) as i64,
    })
}

/// Найти VETO поля. Ключ результата: `{field}_low` / `{field}_high`.
/// Условие должно снижать частоту событий сильнее порога и быть антикоррелированным с ними.
/// Если по одному ключу проходят несколько перцентилей, остаётся самый эффективный.
pub fn find_veto_fields(
    features: &FeatureMatrix,
    events: &[bool],
    config: &VetoConfig,
    significance: f64,
) -> BTreeMap<String, VetoField> {
    let mut result: BTreeMap<String, VetoField> = BTreeMap::new();
    if !events.iter().any(|e| *e) {
        log::warn!("⚠️ No events, VETO search skipped");
        return result;
    }

    for (name, values) in features.numeric_columns() {
        let sorted_values = sorted(values);
        for percentile in VETO_PERCENTILES {
            let Some(veto) = evaluate(name, values, &sorted_values, events, percentile, significance)
            else {
                continue;
            };
            if veto.effectiveness <= config.effectiveness_threshold
                || veto.anticorrelation > config.min_anticorrelation
                || !veto.significant
            {
                continue;
            }

            let key = format!("{}_{}", name, veto.direction.suffix());
            let replace = result
                .get(&key)
                .is_none_or(|existing| veto.effectiveness > existing.effectiveness);
            if replace {
                result.insert(key, veto);
            }
        }
    }

    log::info!("🛑 VETO fields found: {}", result.len());
    result
}

pub fn top_vetos(vetos: &BTreeMap<String, VetoField>, limit: usize) -> Vec<(&str, &VetoField)> {
    let mut ranked: Vec<(&str, &VetoField)> = vetos.iter().map(|(k, v)| (k.as_str(), v)).collect();
    ranked.sort_by(|a, b| b.1.effectiveness.total_cmp(&a.1.effectiveness));
    ranked.truncate(limit);
    ranked
}
