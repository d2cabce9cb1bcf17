//! Типы рыночных фаз поверх OHLC
//! Кульминации, продолжения тренда, консолидации и переходные зоны

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AdvancedEventsConfig;
use crate::events::retracement::{Extremum, ExtremumKind, Retracement};
use crate::stats::{mean, std_dev};

const CULMINATION_LOOKFORWARD: usize = 50;
const CULMINATION_MIN_BARS: usize = 10;
const CULMINATION_MIN_MOVE: f64 = 5.0;
const CULMINATION_MIN_STABILITY: f64 = 0.6;

const CONTINUATION_HISTORY: usize = 20;
const CONTINUATION_FUTURE: usize = 10;
const CONTINUATION_MIN_STRENGTH: f64 = 0.5;

const CONSOLIDATION_WINDOW: usize = 10;
const CONSOLIDATION_MAX_RANGE: f64 = 3.0;

const TRANSITION_WINDOW: usize = 20;
const TRANSITION_MIN_VOL_CHANGE: f64 = 0.1;

const TREND_THRESHOLD_PCT: f64 = 2.0;
const VOLATILITY_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    TopCulmination,
    BottomCulmination,
    UptrendContinuation,
    DowntrendContinuation,
    Consolidation,
    TransitionZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseEvent {
    pub index: usize,
    pub kind: PhaseKind,
    /// 0..1
    pub strength: f64,
    /// Движение цены, %: откат для кульминации, ширина диапазона для консолидации
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_change: Option<(Trend, Trend)>,
}

impl PhaseEvent {
    fn new(index: usize, kind: PhaseKind, strength: f64) -> Self {
        PhaseEvent {
            index,
            kind,
            strength,
            move_pct: None,
            level: None,
            trend_change: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventTypeStats {
    pub count: usize,
    pub rate: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketPhases {
    pub culminations: Vec<PhaseEvent>,
    pub continuations: Vec<PhaseEvent>,
    /// Центры найденных окон консолидации
    pub consolidations: Vec<PhaseEvent>,
    pub transitions: Vec<PhaseEvent>,
    /// Строки внутри любой зоны консолидации
    #[serde(skip)]
    pub consolidation_mask: Vec<bool>,
    pub statistics: BTreeMap<String, EventTypeStats>,
    pub total_records: usize,
}

impl MarketPhases {
    pub fn print(&self) {
        println!("\n🌊 Market phases ({} rows):", self.total_records);
        for (name, stats) in &self.statistics {
            println!("   {:<28} {:>5} ({:.2}%)", name, stats.count, stats.percentage);
        }
    }
}

/// Серии OHLC одинаковой длины
#[derive(Debug, Clone, Copy)]
pub struct Ohlc<'a> {
    pub open: &'a [f64],
    pub high: &'a [f64],
    pub low: &'a [f64],
    pub close: &'a [f64],
}

impl Ohlc<'_> {
    pub fn len(&self) -> usize {
        self.open
            .len()
            .min(self.high.len())
            .min(self.low.len())
            .min(self.close.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn true_range(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                let range = self.high[i] - self.low[i];
                if i == 0 {
                    return range;
                }
                let prev = self.close[i - 1];
                range
                    .max((self.high[i] - prev).abs())
                    .max((self.low[i] - prev).abs())
            })
            .collect()
    }
}

/// Скользящее std (ddof = 1); до заполнения окна 0
pub fn rolling_std(data: &[f64], window: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            if i + 1 < window {
                0.0
            } else {
                std_dev(&data[i + 1 - window..=i])
            }
        })
        .collect()
}

pub fn identify_trend(closes: &[f64]) -> Trend {
    if closes.len() < 5 {
        return Trend::Sideways;
    }
    let (first, last) = (closes[0], closes[closes.len() - 1]);
    if first == 0.0 {
        return Trend::Sideways;
    }
    let change = (last - first) / first * 100.0;
    if change > TREND_THRESHOLD_PCT {
        Trend::Up
    } else if change < -TREND_THRESHOLD_PCT {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

/// Доля баров, на которых close сдвинулся в нужную сторону
fn movement_stability(closes: &[f64], down: bool) -> f64 {
    if closes.len() < 5 {
        return 0.0;
    }
    let moves = closes
        .windows(2)
        .filter(|w| if down { w[1] < w[0] } else { w[1] > w[0] })
        .count();
    moves as f64 / closes.len() as f64
}

pub fn detect_culminations(extrema: &[Extremum], ohlc: Ohlc<'_>, threshold: f64) -> Vec<PhaseEvent> {
    let n = ohlc.len();
    let mut found = Vec::new();

    for extremum in extrema {
        let idx = extremum.index;
        if idx >= n || extremum.price == 0.0 {
            continue;
        }
        let lookforward = CULMINATION_LOOKFORWARD.min(n - idx - 1);
        if lookforward < CULMINATION_MIN_BARS {
            continue;
        }
        let future = idx + 1..idx + 1 + lookforward;
        let closes = &ohlc.close[future.clone()];

        let (move_pct, stability, kind) = match extremum.kind {
            ExtremumKind::High => {
                let min_low = ohlc.low[future].iter().copied().fold(f64::INFINITY, f64::min);
                (
                    (extremum.price - min_low) / extremum.price * 100.0,
                    movement_stability(closes, true),
                    PhaseKind::TopCulmination,
                )
            }
            ExtremumKind::Low => {
                let max_high = ohlc.high[future].iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (
                    (max_high - extremum.price) / extremum.price * 100.0,
                    movement_stability(closes, false),
                    PhaseKind::BottomCulmination,
                )
            }
        };

        if move_pct < CULMINATION_MIN_MOVE || stability <= CULMINATION_MIN_STABILITY {
            continue;
        }
        let strength = (move_pct / 10.0 * stability).min(1.0);
        if strength >= threshold {
            let mut event = PhaseEvent::new(idx, kind, strength);
            event.move_pct = Some(move_pct);
            found.push(event);
        }
    }
    found
}

pub fn detect_continuations(ohlc: Ohlc<'_>) -> Vec<PhaseEvent> {
    let n = ohlc.len();
    if n < CONTINUATION_HISTORY + CONTINUATION_FUTURE {
        return Vec::new();
    }

    let mut found = Vec::new();
    for i in CONTINUATION_HISTORY..n - CONTINUATION_FUTURE {
        let history = i - CONTINUATION_HISTORY..i;
        let future = i..(i + CONTINUATION_FUTURE).min(n);
        let current = ohlc.close[i];
        if current == 0.0 {
            continue;
        }

        let trend = identify_trend(&ohlc.close[history.clone()]);
        let resistance = ohlc.high[history.clone()].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let support = ohlc.low[history].iter().copied().fold(f64::INFINITY, f64::min);

        let max_high = ohlc.high[future.clone()].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_low = ohlc.low[future].iter().copied().fold(f64::INFINITY, f64::min);
        let up = (max_high - current) / current * 100.0;
        let down = (current - min_low) / current * 100.0;

        let (kind, level, strength) = match trend {
            Trend::Up if current > resistance && up > down && up > 1.0 => {
                (PhaseKind::UptrendContinuation, resistance, (up / 5.0).min(1.0))
            }
            Trend::Down if current < support && down > up && down > 1.0 => {
                (PhaseKind::DowntrendContinuation, support, (down / 5.0).min(1.0))
            }
            _ => continue,
        };
        if strength > CONTINUATION_MIN_STRENGTH {
            let mut event = PhaseEvent::new(i, kind, strength);
            event.level = Some(level);
            found.push(event);
        }
    }
    found
}

/// Узкий диапазон и низкая волатильность в окне вокруг бара
pub fn detect_consolidations(
    ohlc: Ohlc<'_>,
    true_range: &[f64],
    max_volatility: f64,
) -> (Vec<PhaseEvent>, Vec<bool>) {
    let n = ohlc.len();
    let half = CONSOLIDATION_WINDOW / 2;
    let mut mask = vec![false; n];
    let mut found = Vec::new();
    if n <= 2 * CONSOLIDATION_WINDOW {
        return (found, mask);
    }

    for i in CONSOLIDATION_WINDOW..n - CONSOLIDATION_WINDOW {
        let window = i - half..(i + half).min(n);
        let avg_price = mean(&ohlc.close[window.clone()]);
        if avg_price == 0.0 {
            continue;
        }
        let high = ohlc.high[window.clone()].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = ohlc.low[window.clone()].iter().copied().fold(f64::INFINITY, f64::min);
        let range_pct = (high - low) / avg_price * 100.0;
        let volatility = mean(&true_range[window.clone()]) / avg_price * 100.0;

        if range_pct < CONSOLIDATION_MAX_RANGE && volatility < max_volatility {
            let mut event = PhaseEvent::new(
                i,
                PhaseKind::Consolidation,
                (1.0 - range_pct / CONSOLIDATION_MAX_RANGE).max(0.1),
            );
            event.move_pct = Some(range_pct);
            found.push(event);
            mask[window].iter_mut().for_each(|m| *m = true);
        }
    }
    (found, mask)
}

/// Смена тренда вместе со сменой волатильности
pub fn detect_transitions(ohlc: Ohlc<'_>, volatility: &[f64]) -> Vec<PhaseEvent> {
    let n = ohlc.len().min(volatility.len());
    if n <= 2 * TRANSITION_WINDOW {
        return Vec::new();
    }

    let mut found = Vec::new();
    for i in TRANSITION_WINDOW..n - TRANSITION_WINDOW {
        let before = i - TRANSITION_WINDOW..i;
        let after = i..i + TRANSITION_WINDOW;

        let before_trend = identify_trend(&ohlc.close[before.clone()]);
        let after_trend = identify_trend(&ohlc.close[after.clone()]);
        let change = (mean(&volatility[before]) - mean(&volatility[after])).abs();

        if before_trend != after_trend && change > TRANSITION_MIN_VOL_CHANGE {
            let mut event = PhaseEvent::new(i, PhaseKind::TransitionZone, change.min(1.0));
            event.trend_change = Some((before_trend, after_trend));
            found.push(event);
        }
    }
    found
}

fn type_stats(count: usize, total: usize) -> EventTypeStats {
    let rate = if total == 0 { 0.0 } else { count as f64 / total as f64 };
    EventTypeStats {
        count,
        rate,
        percentage: rate * 100.0,
    }
}

/// Все типы фаз; откаты учитываются только в статистике
pub fn detect_market_phases(
    ohlc: Ohlc<'_>,
    extrema: &[Extremum],
    retracements: &[Retracement],
    config: &AdvancedEventsConfig,
) -> MarketPhases {
    let n = ohlc.len();
    let true_range = ohlc.true_range();
    let volatility = rolling_std(&true_range, VOLATILITY_WINDOW);

    let culminations = detect_culminations(extrema, ohlc, config.culmination_threshold);
    let continuations = detect_continuations(ohlc);
    let (consolidations, consolidation_mask) =
        detect_consolidations(ohlc, &true_range, config.consolidation_volatility_threshold);
    let transitions = detect_transitions(ohlc, &volatility);

    let mut retracement_counts: BTreeMap<String, usize> = BTreeMap::new();
    for retracement in retracements {
        *retracement_counts
            .entry(format!("retracement_{}pct", retracement.level))
            .or_insert(0) += 1;
    }
    let mut statistics: BTreeMap<String, EventTypeStats> = retracement_counts
        .into_iter()
        .map(|(name, count)| (name, type_stats(count, n)))
        .collect();
    statistics.insert("culmination".to_string(), type_stats(culminations.len(), n));
    statistics.insert("continuation".to_string(), type_stats(continuations.len(), n));
    statistics.insert(
        "consolidation".to_string(),
        type_stats(consolidation_mask.iter().filter(|m| **m).count(), n),
    );
    statistics.insert("transition_zone".to_string(), type_stats(transitions.len(), n));

    log::info!(
        "🌊 Phases: {} culminations, {} continuations, {} consolidation windows, {} transitions",
        culminations.len(),
        continuations.len(),
        consolidations.len(),
        transitions.len()
    );

    MarketPhases {
        culminations,
        continuations,
        consolidations,
        transitions,
        consolidation_mask,
        statistics,
        total_records: n,
    }
}
