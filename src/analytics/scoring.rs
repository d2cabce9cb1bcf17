//! Скоринговая система на основе найденных статистик
//! Веса: ROC-AUC для числовых полей, lift для сигналов, эффективность для VETO

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analytics::correlation::{CorrelationReport, FieldCorrelation};
use crate::analytics::veto::{VetoDirection, VetoField};
use crate::error::ScoringError;
use crate::features::{FeatureMatrix, FeatureSchema};

pub const SCORING_VERSION: &str = "1.0";
pub const METHODOLOGY: &str = "data_driven_statistical_analysis";

const MIN_ROC_FOR_RULE: f64 = 0.55;
const MIN_SIGNAL_COUNT: usize = 5;
const POSITIVE_WEIGHT_TOTAL: f64 = 0.8;
const NEGATIVE_WEIGHT_TOTAL: f64 = 0.2;
const CONFIDENCE_FEATURES: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Numeric,
    Categorical,
    Veto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCondition {
    /// value > threshold
    Above { threshold: f64 },
    SignalEquals { signal: String },
    Veto {
        direction: VetoDirection,
        threshold: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub feature: String,
    /// Колонка матрицы признаков, к которой применяется условие
    pub base_field: String,
    pub kind: RuleKind,
    pub condition: RuleCondition,
    pub importance: f64,
    pub weight: f64,
    pub weight_source: String,
    pub roc_auc: Option<f64>,
    pub effectiveness: Option<f64>,
    pub p_value: Option<f64>,
    pub significant: bool,
}

impl ScoringRule {
    pub fn is_active(&self, features: &FeatureMatrix, row: usize) -> bool {
        let Some(column) = features.column(&self.base_field) else {
            return false;
        };
        match &self.condition {
            RuleCondition::Above { threshold } => column
                .as_numeric()
                .is_some_and(|v| v[row] > *threshold),
            RuleCondition::SignalEquals { signal } => column
                .as_categorical()
                .is_some_and(|v| v[row].as_deref() == Some(signal.as_str())),
            RuleCondition::Veto {
                direction,
                threshold,
            } => column
                .as_numeric()
                .is_some_and(|v| direction.holds(v[row], *threshold)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureBreakdown {
    pub numeric_features: usize,
    pub categorical_features: usize,
    pub veto_features: usize,
}

impl FeatureBreakdown {
    pub fn count(rules: &[ScoringRule]) -> Self {
        let of = |kind| rules.iter().filter(|r| r.kind == kind).count();
        FeatureBreakdown {
            numeric_features: of(RuleKind::Numeric),
            categorical_features: of(RuleKind::Categorical),
            veto_features: of(RuleKind::Veto),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSystem {
    pub version: String,
    pub methodology: String,
    pub created: String,
    pub event_rate: f64,
    pub significance_level: f64,
    pub min_correlation: f64,
    pub validation_score: Option<f64>,
    pub feature_breakdown: FeatureBreakdown,
    pub rules: Vec<ScoringRule>,
    pub schema: FeatureSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowScore {
    pub raw_score: f64,
    /// raw_score / сумма положительных весов, в [0, 1]
    pub score: f64,
    pub confidence: f64,
    pub active_features: usize,
    pub veto_triggered: usize,
    pub contributions: BTreeMap<String, f64>,
}

fn numeric_rule(field: &str, correlation: &FieldCorrelation) -> Option<ScoringRule> {
    let numeric = correlation.as_numeric()?;
    let roc = numeric.best_roc_auc?;
    let threshold = numeric.best_threshold?;
    if roc <= MIN_ROC_FOR_RULE {
        return None;
    }
    Some(ScoringRule {
        feature: format!("{field}_activated"),
        base_field: field.to_string(),
        kind: RuleKind::Numeric,
        condition: RuleCondition::Above { threshold },
        importance: roc - 0.5,
        weight: 0.0,
        weight_source: "roc_auc".to_string(),
        roc_auc: Some(roc),
        effectiveness: None,
        p_value: Some(numeric.p_value),
        significant: numeric.significant,
    })
}

fn signal_rules(field: &str, correlation: &FieldCorrelation, event_rate: f64) -> Vec<ScoringRule> {
    let FieldCorrelation::Categorical(signals) = correlation else {
        return Vec::new();
    };

    signals
        .signals
        .iter()
        .filter(|(_, s)| s.significant && s.count >= MIN_SIGNAL_COUNT)
        .map(|(signal, s)| {
            let importance = if event_rate > 0.0 {
                ((s.effectiveness / event_rate - 1.0) * s.frequency).max(0.0)
            } else {
                s.effectiveness * s.frequency
            };
            ScoringRule {
                feature: format!("{}_{}_activated", field, signal.replace('!', "excl")),
                base_field: field.to_string(),
                kind: RuleKind::Categorical,
                condition: RuleCondition::SignalEquals {
                    signal: signal.clone(),
                },
                importance,
                weight: 0.0,
                weight_source: "signal_lift".to_string(),
                roc_auc: None,
                effectiveness: Some(s.effectiveness),
                p_value: Some(s.p_value),
                significant: s.significant,
            }
        })
        .collect()
}

fn veto_rule(name: &str, veto: &VetoField) -> Option<ScoringRule> {
    if !veto.significant {
        return None;
    }
    Some(ScoringRule {
        feature: format!("{name}_veto"),
        base_field: veto.field.clone(),
        kind: RuleKind::Veto,
        condition: RuleCondition::Veto {
            direction: veto.direction,
            threshold: veto.threshold,
        },
        importance: -veto.effectiveness * veto.activation_frequency,
        weight: 0.0,
        weight_source: "veto_effectiveness".to_string(),
        roc_auc: None,
        effectiveness: Some(veto.effectiveness),
        p_value: Some(veto.p_value),
        significant: veto.significant,
    })
}

/// Положительные веса в сумме 0.8, отрицательные -0.2.
/// Без положительных весов важности остаются как есть.
pub fn normalize_weights(rules: &mut [ScoringRule]) {
    let positive: f64 = rules.iter().map(|r| r.importance).filter(|i| *i > 0.0).sum();
    let negative: f64 = rules.iter().map(|r| r.importance).filter(|i| *i < 0.0).sum();

    if positive <= 0.0 {
        for rule in rules.iter_mut() {
            rule.weight = rule.importance;
        }
        return;
    }

    for rule in rules.iter_mut() {
        rule.weight = if rule.importance > 0.0 {
            rule.importance / positive * POSITIVE_WEIGHT_TOTAL
        } else if rule.importance < 0.0 && negative < 0.0 {
            rule.importance / negative.abs() * NEGATIVE_WEIGHT_TOTAL
        } else {
            0.0
        };
    }
}

impl ScoringSystem {
    pub fn build(
        correlations: &CorrelationReport,
        vetos: &BTreeMap<String, VetoField>,
        event_rate: f64,
        schema: FeatureSchema,
        significance_level: f64,
        min_correlation: f64,
    ) -> Self {
        let mut rules = Vec::new();

        for (field, correlation) in &correlations.fields {
            if field.ends_with("_signal") {
                rules.extend(signal_rules(field, correlation, event_rate));
            } else if let Some(rule) = numeric_rule(field, correlation) {
                rules.push(rule);
            }
        }
        rules.extend(vetos.iter().filter_map(|(name, veto)| veto_rule(name, veto)));

        normalize_weights(&mut rules);
        rules.retain(|r| r.weight != 0.0);
        rules.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
        let breakdown = FeatureBreakdown::count(&rules);

        log::info!(
            "⚖️ Scoring system: {} numeric, {} categorical, {} veto rules",
            breakdown.numeric_features,
            breakdown.categorical_features,
            breakdown.veto_features
        );

        ScoringSystem {
            version: SCORING_VERSION.to_string(),
            methodology: METHODOLOGY.to_string(),
            created: chrono::Utc::now().to_rfc3339(),
            event_rate,
            significance_level,
            min_correlation,
            validation_score: None,
            feature_breakdown: breakdown,
            rules,
            schema,
        }
    }

    pub fn positive_weight_total(&self) -> f64 {
        self.rules.iter().map(|r| r.weight).filter(|w| *w > 0.0).sum()
    }

    pub fn score_row(&self, features: &FeatureMatrix, row: usize) -> RowScore {
        let mut raw_score = 0.0;
        let mut active_features = 0;
        let mut veto_triggered = 0;
        let mut contributions = BTreeMap::new();

        for rule in &self.rules {
            if !rule.is_active(features, row) {
                continue;
            }
            raw_score += rule.weight;
            contributions.insert(rule.feature.clone(), rule.weight);
            if rule.kind == RuleKind::Veto {
                veto_triggered += 1;
            } else {
                active_features += 1;
            }
        }

        let positive_total = self.positive_weight_total();
        let score = if positive_total > 0.0 {
            (raw_score / positive_total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        RowScore {
            raw_score,
            score,
            confidence: (active_features as f64 / CONFIDENCE_FEATURES).min(1.0),
            active_features,
            veto_triggered,
            contributions,
        }
    }

    /// Сырые скоры для всех строк
    pub fn raw_scores(&self, features: &FeatureMatrix) -> Vec<f64> {
        (0..features.rows())
            .map(|row| {
                self.rules
                    .iter()
                    .filter(|r| r.is_active(features, row))
                    .map(|r| r.weight)
                    .sum()
            })
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), ScoringError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ScoringError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let content = fs::read_to_string(path).map_err(|source| ScoringError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
