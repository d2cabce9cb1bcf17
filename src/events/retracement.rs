//! Откаты от локальных экстремумов
//! Экстремум ищется по high/low с несколькими окнами, откат измеряется в процентах

use serde::Serialize;

use crate::config::AdvancedEventsConfig;

const EXTREMUM_ORDERS: [usize; 4] = [5, 10, 15, 20];
const MIN_RETRACEMENT_PCT: f64 = 2.0;
pub const DEFAULT_RETRACEMENT_LEVELS: [u32; 5] = [2, 3, 5, 7, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremum {
    pub index: usize,
    pub kind: ExtremumKind,
    pub price: f64,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retracement {
    pub extremum_index: usize,
    pub extremum_kind: ExtremumKind,
    /// Процент отката
    pub strength: f64,
    /// Наибольший настроенный уровень, который откат достиг
    pub level: u32,
    pub max_index: usize,
    pub end_index: usize,
}

/// Строгий локальный экстремум порядка `order`. Соседи за краями берутся с края.
fn is_extremum(data: &[f64], i: usize, order: usize, kind: ExtremumKind) -> bool {
    let last = data.len() - 1;
    (1..=order).all(|k| {
        let left = data[i.saturating_sub(k)];
        let right = data[(i + k).min(last)];
        match kind {
            ExtremumKind::High => data[i] > left && data[i] > right,
            ExtremumKind::Low => data[i] < left && data[i] < right,
        }
    })
}

pub fn find_extrema(highs: &[f64], lows: &[f64]) -> Vec<Extremum> {
    let n = highs.len().min(lows.len());
    if n < 3 {
        return Vec::new();
    }

    let mut extrema: Vec<Extremum> = Vec::new();
    for order in EXTREMUM_ORDERS {
        for i in 0..n {
            for (kind, series) in [(ExtremumKind::High, highs), (ExtremumKind::Low, lows)] {
                if !is_extremum(&series[..n], i, order, kind) {
                    continue;
                }
                if extrema.iter().any(|e| e.index == i && e.kind == kind) {
                    continue;
                }
                extrema.push(Extremum {
                    index: i,
                    kind,
                    price: series[i],
                    order,
                });
            }
        }
    }
    extrema.sort_by_key(|e| e.index);
    extrema
}

/// Оставить экстремумы, отстоящие от предыдущего значимого не меньше чем на `min_move_pct`
pub fn filter_significant(extrema: Vec<Extremum>, min_move_pct: f64) -> Vec<Extremum> {
    let mut significant: Vec<Extremum> = Vec::with_capacity(extrema.len());
    for extremum in extrema {
        let keep = match significant.last() {
            None => true,
            Some(prev) if prev.price == 0.0 => false,
            Some(prev) => ((extremum.price - prev.price) / prev.price).abs() * 100.0 >= min_move_pct,
        };
        if keep {
            significant.push(extremum);
        }
    }
    significant
}

/// Наибольший уровень из `levels`, не превышающий процент отката
pub fn classify_level(retracement_pct: f64, levels: &[u32]) -> Option<u32> {
    levels
        .iter()
        .copied()
        .filter(|level| retracement_pct >= f64::from(*level))
        .max()
}

/// Откат после экстремума: цена обновляет противоположный край, пока движение продолжается
fn retracement_from(
    extremum: &Extremum,
    highs: &[f64],
    lows: &[f64],
    time_window: [usize; 2],
    levels: &[u32],
) -> Option<Retracement> {
    let n = highs.len().min(lows.len());
    let start = extremum.index + 1;
    let end = n.min(extremum.index + time_window[1]);
    if start >= end || extremum.price == 0.0 {
        return None;
    }

    let mut running = extremum.price;
    let mut max_retracement = 0.0;
    let mut max_index = None;
    let mut end_index = None;

    for idx in start..end {
        let (pct, continues) = match extremum.kind {
            ExtremumKind::High => (
                (extremum.price - lows[idx]) / extremum.price * 100.0,
                lows[idx] <= running,
            ),
            ExtremumKind::Low => (
                (highs[idx] - extremum.price) / extremum.price * 100.0,
                highs[idx] >= running,
            ),
        };

        if continues {
            running = match extremum.kind {
                ExtremumKind::High => lows[idx],
                ExtremumKind::Low => highs[idx],
            };
            if pct > max_retracement {
                max_retracement = pct;
                max_index = Some(idx);
            }
        } else if max_retracement > 0.0 {
            end_index = Some(idx);
            break;
        }
    }

    let max_index = max_index?;
    if max_retracement < MIN_RETRACEMENT_PCT {
        return None;
    }
    let end_index = end_index.unwrap_or(max_index);
    if end_index - extremum.index < time_window[0] {
        return None;
    }

    Some(Retracement {
        extremum_index: extremum.index,
        extremum_kind: extremum.kind,
        strength: max_retracement,
        level: classify_level(max_retracement, levels)?,
        max_index,
        end_index,
    })
}

pub fn detect_retracements(
    highs: &[f64],
    lows: &[f64],
    config: &AdvancedEventsConfig,
) -> Vec<Retracement> {
    let extrema = filter_significant(find_extrema(highs, lows), config.min_extremum_move);
    log::debug!("Found {} significant extrema", extrema.len());

    let levels = if config.retracement_levels.is_empty() {
        DEFAULT_RETRACEMENT_LEVELS.as_slice()
    } else {
        config.retracement_levels.as_slice()
    };

    extrema
        .iter()
        .filter_map(|e| retracement_from(e, highs, lows, config.retracement_time_window, levels))
        .collect()
}
