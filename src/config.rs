//! Конфигурация анализатора
//! Загружается из YAML, любые отсутствующие поля берутся по умолчанию

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::events::DEFAULT_RETRACEMENT_LEVELS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub events: EventsConfig,
    pub advanced_events: AdvancedEventsConfig,
    pub analysis: AnalysisConfig,
    pub veto: VetoConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
}

/// Параметры автоматического поиска событий
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub min_price_change: f64,
    pub lookback_window: usize,
    pub min_event_gap: usize,
    pub include_retracements: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        EventsConfig {
            min_price_change: 0.01,
            lookback_window: 20,
            min_event_gap: 5,
            include_retracements: true,
        }
    }
}

/// Откаты от экстремумов
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedEventsConfig {
    /// Уровни в процентах
    pub retracement_levels: Vec<u32>,
    /// [min, max] в барах
    pub retracement_time_window: [usize; 2],
    /// Минимальное движение между экстремумами, %
    pub min_extremum_move: f64,
    /// Минимальная сила кульминации, 0..1
    pub culmination_threshold: f64,
    /// Максимальная средняя волатильность бара в консолидации, %
    pub consolidation_volatility_threshold: f64,
}

impl Default for AdvancedEventsConfig {
    fn default() -> Self {
        AdvancedEventsConfig {
            retracement_levels: DEFAULT_RETRACEMENT_LEVELS.to_vec(),
            retracement_time_window: [1, 90],
            min_extremum_move: 1.0,
            culmination_threshold: 0.8,
            consolidation_volatility_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_correlation: f64,
    pub significance_level: f64,
    pub min_samples: usize,
    pub max_lag: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            min_correlation: 0.05,
            significance_level: 0.05,
            min_samples: 10,
            max_lag: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VetoConfig {
    /// Максимальная корреляция условия с событиями
    pub min_anticorrelation: f64,
    pub effectiveness_threshold: f64,
    /// Поля-блокираторы: минимальное падение точности базового сигнала
    pub min_blocking_strength: f64,
    pub max_blocking_fields: usize,
}

impl Default for VetoConfig {
    fn default() -> Self {
        VetoConfig {
            min_anticorrelation: -0.1,
            effectiveness_threshold: 0.3,
            min_blocking_strength: 0.1,
            max_blocking_fields: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            test_fraction: 0.3,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub results_dir: PathBuf,
    pub charts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            results_dir: PathBuf::from("results"),
            charts: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Загрузить конфигурацию. Несуществующий файл означает значения по умолчанию.
pub fn load_config(path: &Path) -> Result<AnalyzerConfig, ConfigError> {
    if !path.exists() {
        log::warn!("⚠️ Config {} not found, using defaults", path.display());
        return Ok(AnalyzerConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = AnalyzerConfig::from_yaml_str(&content)?;
    log::info!("⚙️ Config loaded from {}", path.display());
    Ok(config)
}
