//! Автоматическое определение событий
//! Событие - локальный экстремум цены, откат или всплеск волатильности

pub mod phases;
pub mod retracement;

pub use phases::*;
pub use retracement::*;

use serde::Serialize;

use crate::config::{AdvancedEventsConfig, EventsConfig};
use crate::error::AnalysisError;
use crate::features::FeatureMatrix;
use crate::stats::{pct_change, std_dev};

pub const MIN_PRICE_ROWS: usize = 20;
pub const DETECTION_METHOD: &str = "automatic_extrema_volatility";

#[derive(Debug, Clone, Serialize)]
pub struct EventParameters {
    pub lookback_window: usize,
    pub min_price_change: f64,
    pub volatility_threshold: f64,
    pub min_event_gap: usize,
    pub price_field_used: String,
    pub include_retracements: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSet {
    #[serde(skip)]
    pub mask: Vec<bool>,
    pub total_events: usize,
    pub event_rate: f64,
    pub method: String,
    pub parameters: EventParameters,
    pub extrema_candidates: usize,
    pub volatility_candidates: usize,
    pub event_indices: Vec<usize>,
    pub retracements: Vec<Retracement>,
}

impl EventSet {
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn print(&self) {
        println!("\n🎯 Events:");
        println!("   Price field: {}", self.parameters.price_field_used);
        println!(
            "   Total: {} ({:.2}% of rows)",
            self.total_events,
            self.event_rate * 100.0
        );
        println!(
            "   Candidates: extrema {}, volatility {}, retracements {}",
            self.extrema_candidates,
            self.volatility_candidates,
            self.retracements.len()
        );
    }
}

pub struct EventDetector {
    events: EventsConfig,
    advanced: AdvancedEventsConfig,
}

impl EventDetector {
    pub fn new(events: EventsConfig, advanced: AdvancedEventsConfig) -> Self {
        EventDetector { events, advanced }
    }

    fn price_field(features: &FeatureMatrix) -> Option<(String, &[f64])> {
        for name in ["meta_close", "close"] {
            if let Some(values) = features.numeric(name) {
                return Some((name.to_string(), values));
            }
        }
        features
            .numeric_columns()
            .find(|(name, _)| name.contains("close") && !name.contains("position"))
            .map(|(name, values)| (name.to_string(), values))
    }

    fn ohlc(features: &FeatureMatrix) -> Option<Ohlc<'_>> {
        Some(Ohlc {
            open: features.numeric("meta_open")?,
            high: features.numeric("meta_high")?,
            low: features.numeric("meta_low")?,
            close: features.numeric("meta_close")?,
        })
    }

    /// Кульминации, продолжения, консолидации и переходные зоны.
    /// Без OHLC колонок результат пустой.
    pub fn detect_phases(&self, features: &FeatureMatrix, retracements: &[Retracement]) -> MarketPhases {
        let Some(ohlc) = Self::ohlc(features) else {
            log::warn!("⚠️ OHLC columns missing, market phases skipped");
            return MarketPhases::default();
        };
        let extrema = filter_significant(
            find_extrema(ohlc.high, ohlc.low),
            self.advanced.min_extremum_move,
        );
        detect_market_phases(ohlc, &extrema, retracements, &self.advanced)
    }

    /// Бары, которые одновременно экстремум левого `[i-w, i]` и правого `[i, i+w)` окна
    fn extrema_candidates(&self, prices: &[f64]) -> Vec<usize> {
        let window = self.events.lookback_window.max(1);
        let n = prices.len();
        if n <= 2 * window {
            return Vec::new();
        }

        let mut found = Vec::new();
        for i in window..n - window {
            let price = prices[i];
            let left = &prices[i - window..=i];
            let right = &prices[i..i + window];

            let is_max = left.iter().all(|&p| p <= price) && right.iter().all(|&p| p <= price);
            let is_min = left.iter().all(|&p| p >= price) && right.iter().all(|&p| p >= price);
            if !is_max && !is_min {
                continue;
            }

            let base = prices[i - window];
            let change = if base == 0.0 { 0.0 } else { ((price - base) / base).abs() };
            if change >= self.events.min_price_change {
                found.push(i);
            }
        }
        found
    }

    /// |pct_change| > 2 sigma
    fn volatility_candidates(prices: &[f64]) -> (Vec<usize>, f64) {
        let returns = pct_change(prices);
        let threshold = std_dev(&returns) * 2.0;
        let found = returns
            .iter()
            .enumerate()
            .filter(|(_, r)| r.abs() > threshold)
            .map(|(idx, _)| idx + 1)
            .collect();
        (found, threshold)
    }

    /// Следующее событие не ближе `min_gap` баров к предыдущему принятому
    pub fn apply_min_gap(candidates: &[usize], min_gap: usize) -> Vec<usize> {
        let mut kept: Vec<usize> = Vec::new();
        for &idx in candidates {
            if kept.last().is_none_or(|&last| idx - last >= min_gap) {
                kept.push(idx);
            }
        }
        kept
    }

    pub fn detect(&self, features: &FeatureMatrix) -> Result<EventSet, AnalysisError> {
        let (price_field, prices) =
            Self::price_field(features).ok_or(AnalysisError::MissingPriceField)?;
        if prices.len() < MIN_PRICE_ROWS {
            return Err(AnalysisError::InsufficientData {
                found: prices.len(),
                required: MIN_PRICE_ROWS,
            });
        }
        log::info!("🎯 Detecting events on {} ({} rows)", price_field, prices.len());

        let extrema = self.extrema_candidates(prices);
        let (volatile, volatility_threshold) = Self::volatility_candidates(prices);

        let retracements = match (features.numeric("meta_high"), features.numeric("meta_low")) {
            (Some(highs), Some(lows)) if self.events.include_retracements => {
                detect_retracements(highs, lows, &self.advanced)
            }
            _ => Vec::new(),
        };

        let mut candidates: Vec<usize> = extrema
            .iter()
            .chain(volatile.iter())
            .copied()
            .chain(retracements.iter().map(|r| r.end_index))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let event_indices = Self::apply_min_gap(&candidates, self.events.min_event_gap);
        let mut mask = vec![false; prices.len()];
        for &idx in &event_indices {
            mask[idx] = true;
        }

        let total_events = event_indices.len();
        let event_rate = total_events as f64 / prices.len() as f64;
        log::info!(
            "✅ Found {} events ({:.2}%): extrema {}, volatility {}, retracements {}",
            total_events,
            event_rate * 100.0,
            extrema.len(),
            volatile.len(),
            retracements.len()
        );
        if total_events == 0 {
            log::warn!("⚠️ No events detected, correlation analysis will be empty");
        }

        Ok(EventSet {
            mask,
            total_events,
            event_rate,
            method: DETECTION_METHOD.to_string(),
            parameters: EventParameters {
                lookback_window: self.events.lookback_window,
                min_price_change: self.events.min_price_change,
                volatility_threshold,
                min_event_gap: self.events.min_event_gap,
                price_field_used: price_field,
                include_retracements: self.events.include_retracements,
            },
            extrema_candidates: extrema.len(),
            volatility_candidates: volatile.len(),
            event_indices,
            retracements,
        })
    }
}
