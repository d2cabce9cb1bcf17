//! Паттерны индикаторов на лоях и хаях
//! Экстремумы делятся по величине последующего отката, затем типы сравниваются между собой

use std::collections::BTreeMap;

use serde::Serialize;

use crate::features::FeatureMatrix;
use crate::stats::{mean, median, min_max, population_std};

const EXTREMUM_WINDOW: usize = 10;
const FOLLOW_UP_BARS: usize = 30;
const MIN_EVENTS_PER_TYPE: usize = 3;
const MIN_VALUES: usize = 2;
const MIN_DISCRIMINATIVE_POWER: f64 = 0.5;
const ACTIVATION_WEIGHT: f64 = 10.0;
const VETO_BAD_ACTIVATION: f64 = 0.7;
const VETO_GOOD_ACTIVATION: f64 = 0.3;
const TOP_INDICATORS: usize = 20;

pub const STRONG_LOW: &str = "low_with_rebound_3pct";
pub const WEAK_LOW: &str = "low_no_rebound";
pub const STRONG_HIGH: &str = "high_with_decline_3pct";
pub const WEAK_HIGH: &str = "high_no_decline";

const COMPARISONS: [(&str, &str); 3] = [
    (STRONG_LOW, WEAK_LOW),
    (STRONG_HIGH, WEAK_HIGH),
    (STRONG_LOW, STRONG_HIGH),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumCategory {
    LowEvent,
    HighEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtremumEvent {
    pub index: usize,
    pub category: ExtremumCategory,
    pub event_type: String,
    pub price: f64,
    /// Отскок от лоя или откат от хая за следующие бары, %
    pub move_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorPattern {
    pub activation_count: usize,
    pub activation_rate: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub abs_mean: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypePattern {
    pub count: usize,
    pub indicators: BTreeMap<String, IndicatorPattern>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Discriminator {
    pub indicator: String,
    pub discriminative_power: f64,
    pub mean_diff: f64,
    pub activation_diff: f64,
    pub first_mean: f64,
    pub second_mean: f64,
    pub first_activation: f64,
    pub second_activation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternVeto {
    pub good_activation: f64,
    pub bad_activation: f64,
    pub veto_strength: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedIndicator {
    pub indicator: String,
    pub mean: f64,
    pub activation_rate: f64,
    pub importance: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternAnalysis {
    pub events: Vec<ExtremumEvent>,
    pub type_counts: BTreeMap<String, usize>,
    pub patterns: BTreeMap<String, TypePattern>,
    /// `{first}_vs_{second}` -> индикаторы по убыванию силы
    pub discriminative: BTreeMap<String, Vec<Discriminator>>,
    /// `{good}_blocked_by` -> индикатор -> VETO
    pub veto_patterns: BTreeMap<String, BTreeMap<String, PatternVeto>>,
    pub top_indicators: BTreeMap<String, Vec<RankedIndicator>>,
}

fn low_type(rebound_pct: f64) -> &'static str {
    if rebound_pct >= 3.0 {
        STRONG_LOW
    } else if rebound_pct >= 2.0 {
        "low_with_rebound_2pct"
    } else if rebound_pct >= 1.0 {
        "low_with_rebound_1pct"
    } else {
        WEAK_LOW
    }
}

fn high_type(decline_pct: f64) -> &'static str {
    if decline_pct >= 3.0 {
        STRONG_HIGH
    } else if decline_pct >= 2.0 {
        "high_with_decline_2pct"
    } else if decline_pct >= 1.0 {
        "high_with_decline_1pct"
    } else {
        WEAK_HIGH
    }
}

/// Строгие экстремумы в окне ±10 баров; после каждого нужны 30 баров для оценки отката
pub fn detect_extremum_events(highs: &[f64], lows: &[f64]) -> Vec<ExtremumEvent> {
    let n = highs.len().min(lows.len());
    if n < EXTREMUM_WINDOW * 2 + FOLLOW_UP_BARS + 1 {
        return Vec::new();
    }
    let range = EXTREMUM_WINDOW..n - EXTREMUM_WINDOW - FOLLOW_UP_BARS;
    let neighbours = |i: usize| (i - EXTREMUM_WINDOW..=i + EXTREMUM_WINDOW).filter(move |&j| j != i);

    let mut events = Vec::new();
    for i in range.clone() {
        let low = lows[i];
        if low > 0.0 && neighbours(i).all(|j| lows[j] > low) {
            let max_after = highs[i..i + FOLLOW_UP_BARS].iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let rebound = (max_after - low) / low * 100.0;
            events.push(ExtremumEvent {
                index: i,
                category: ExtremumCategory::LowEvent,
                event_type: low_type(rebound).to_string(),
                price: low,
                move_pct: rebound,
            });
        }
    }
    for i in range {
        let high = highs[i];
        if high > 0.0 && neighbours(i).all(|j| highs[j] < high) {
            let min_after = lows[i..i + FOLLOW_UP_BARS].iter().copied().fold(f64::INFINITY, f64::min);
            let decline = (high - min_after) / high * 100.0;
            events.push(ExtremumEvent {
                index: i,
                category: ExtremumCategory::HighEvent,
                event_type: high_type(decline).to_string(),
                price: high,
                move_pct: decline,
            });
        }
    }
    events
}

/// Статистика по ненулевым значениям индикатора в строках событий
fn indicator_pattern(values: &[f64], events: usize) -> Option<IndicatorPattern> {
    let active: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0 && v.is_finite()).collect();
    if active.len() < MIN_VALUES {
        return None;
    }
    let (min, max) = min_max(&active);
    Some(IndicatorPattern {
        activation_count: active.len(),
        activation_rate: active.len() as f64 / events as f64,
        mean: mean(&active),
        median: median(&active),
        std: population_std(&active),
        min,
        max,
        abs_mean: active.iter().map(|v| v.abs()).sum::<f64>() / active.len() as f64,
    })
}

fn compare(first: &TypePattern, second: &TypePattern) -> Vec<Discriminator> {
    let mut found: Vec<Discriminator> = first
        .indicators
        .iter()
        .filter_map(|(name, a)| {
            let b = second.indicators.get(name)?;
            let mean_diff = (a.mean - b.mean).abs();
            let activation_diff = (a.activation_rate - b.activation_rate).abs();
            let power = mean_diff + activation_diff * ACTIVATION_WEIGHT;
            (power > MIN_DISCRIMINATIVE_POWER).then(|| Discriminator {
                indicator: name.clone(),
                discriminative_power: power,
                mean_diff,
                activation_diff,
                first_mean: a.mean,
                second_mean: b.mean,
                first_activation: a.activation_rate,
                second_activation: b.activation_rate,
            })
        })
        .collect();
    found.sort_by(|a, b| b.discriminative_power.total_cmp(&a.discriminative_power));
    found
}

/// Индикаторы, активные в слабых событиях и молчащие в сильных
fn pattern_vetos(good: &TypePattern, bad: &TypePattern) -> BTreeMap<String, PatternVeto> {
    let activation = |p: &TypePattern, name: &str| {
        p.indicators.get(name).map_or(0.0, |s| s.activation_rate)
    };
    good.indicators
        .keys()
        .chain(bad.indicators.keys())
        .filter_map(|name| {
            let good_activation = activation(good, name);
            let bad_activation = activation(bad, name);
            (bad_activation > VETO_BAD_ACTIVATION && good_activation < VETO_GOOD_ACTIVATION).then(|| {
                (
                    name.clone(),
                    PatternVeto {
                        good_activation,
                        bad_activation,
                        veto_strength: bad_activation - good_activation,
                    },
                )
            })
        })
        .collect()
}

fn rank_indicators(pattern: &TypePattern) -> Vec<RankedIndicator> {
    let mut ranked: Vec<RankedIndicator> = pattern
        .indicators
        .iter()
        .map(|(name, s)| RankedIndicator {
            indicator: name.clone(),
            mean: s.mean,
            activation_rate: s.activation_rate,
            importance: s.activation_rate * (1.0 + s.mean.abs()),
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked.truncate(TOP_INDICATORS);
    ranked
}

/// Полный анализ: события по типам, профили индикаторов, сравнения и VETO
pub fn analyze_extremum_patterns(features: &FeatureMatrix) -> PatternAnalysis {
    let (Some(highs), Some(lows)) = (features.numeric("meta_high"), features.numeric("meta_low"))
    else {
        return PatternAnalysis::default();
    };
    let events = detect_extremum_events(highs, lows);

    let mut by_type: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for event in &events {
        by_type.entry(event.event_type.clone()).or_default().push(event.index);
    }
    let type_counts = by_type.iter().map(|(k, v)| (k.clone(), v.len())).collect();

    let indicator_columns: Vec<(&str, &[f64])> = features
        .numeric_columns()
        .filter(|(name, _)| name.ends_with("_ind"))
        .collect();

    let patterns: BTreeMap<String, TypePattern> = by_type
        .iter()
        .filter(|(_, rows)| rows.len() >= MIN_EVENTS_PER_TYPE)
        .map(|(event_type, rows)| {
            let indicators = indicator_columns
                .iter()
                .filter_map(|(name, values)| {
                    let at_events: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
                    indicator_pattern(&at_events, rows.len()).map(|p| (name.to_string(), p))
                })
                .collect();
            (
                event_type.clone(),
                TypePattern {
                    count: rows.len(),
                    indicators,
                },
            )
        })
        .collect();

    let discriminative = COMPARISONS
        .iter()
        .filter_map(|(first, second)| {
            let (a, b) = (patterns.get(*first)?, patterns.get(*second)?);
            Some((format!("{first}_vs_{second}"), compare(a, b)))
        })
        .collect();

    let mut veto_patterns: BTreeMap<String, BTreeMap<String, PatternVeto>> = BTreeMap::new();
    for good in [STRONG_LOW, STRONG_HIGH] {
        for bad in [WEAK_LOW, WEAK_HIGH] {
            let (Some(g), Some(b)) = (patterns.get(good), patterns.get(bad)) else {
                continue;
            };
            let vetos = pattern_vetos(g, b);
            if !vetos.is_empty() {
                veto_patterns
                    .entry(format!("{good}_blocked_by"))
                    .or_default()
                    .extend(vetos);
            }
        }
    }

    let top_indicators = patterns
        .iter()
        .map(|(name, pattern)| (name.clone(), rank_indicators(pattern)))
        .collect();

    log::info!(
        "📐 Extremum patterns: {} events in {} types, {} comparisons",
        events.len(),
        patterns.len(),
        COMPARISONS.len()
    );

    PatternAnalysis {
        events,
        type_counts,
        patterns,
        discriminative,
        veto_patterns,
        top_indicators,
    }
}
