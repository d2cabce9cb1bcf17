//! Раздельный скоринг по таймфреймам
//! LTF и HTF индикаторы оцениваются каждый своей системой на общих событиях, затем системы сравниваются

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::log_analyzer::LogAnalyzer;
use crate::analytics::validation::{ValidationResult, validate};
use crate::features::{FeatureBuilder, FeatureMatrix, FeatureSchema};
use crate::parser::LogDataset;
use crate::parser::Timeframe;
use crate::parser::fields::split_field_name;
use crate::stats::pearson_corr;

pub const MIN_TIMEFRAME_ACCURACY: f64 = 0.55;
pub const MIN_TIMEFRAME_LIFT: f64 = 1.2;

#[derive(Debug, Clone, Serialize)]
pub struct GroupCorrelation {
    pub event_correlation: f64,
    pub feature_count: usize,
    pub avg_activity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeframeScoring {
    pub timeframe: Timeframe,
    pub indicator_fields: usize,
    pub features: usize,
    pub rules: usize,
    pub group_correlations: BTreeMap<String, GroupCorrelation>,
    pub validation: ValidationResult,
    pub meets_requirements: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeframeComparison {
    pub ltf: Option<TimeframeScoring>,
    pub htf: Option<TimeframeScoring>,
    /// Таймфрейм с большим ROC-AUC на отложенной выборке
    pub better: Option<Timeframe>,
    pub roc_auc_difference: f64,
}

fn field_timeframe(field: &str) -> Option<Timeframe> {
    let (_, suffix) = split_field_name(field);
    Timeframe::from_suffix(suffix)
}

/// Схема только с индикаторами одного таймфрейма; метаданные свечи общие
pub fn schema_for(schema: &FeatureSchema, timeframe: Timeframe) -> FeatureSchema {
    let keep = |field: &String| field_timeframe(field) == Some(timeframe);
    let groups = schema
        .groups
        .iter()
        .filter_map(|(group, fields)| {
            let fields: Vec<String> = fields.iter().filter(|f| keep(*f)).cloned().collect();
            (!fields.is_empty()).then(|| (group.clone(), fields))
        })
        .collect();
    FeatureSchema {
        groups,
        signal_fields: schema.signal_fields.iter().filter(|f| keep(*f)).cloned().collect(),
        metadata: schema.metadata.clone(),
    }
}

/// Корреляция средней |активности| группы с событиями
pub fn group_correlations(
    features: &FeatureMatrix,
    schema: &FeatureSchema,
    events: &[bool],
) -> BTreeMap<String, GroupCorrelation> {
    let labels: Vec<f64> = events.iter().map(|&e| if e { 1.0 } else { 0.0 }).collect();
    schema
        .groups
        .iter()
        .filter_map(|(group, fields)| {
            let columns: Vec<&[f64]> = fields
                .iter()
                .filter_map(|f| features.numeric(&format!("{f}_ind")))
                .collect();
            if columns.is_empty() {
                return None;
            }
            let activity: Vec<f64> = (0..features.rows())
                .map(|row| columns.iter().map(|c| c[row].abs()).sum::<f64>() / columns.len() as f64)
                .collect();
            let avg_activity = if activity.is_empty() {
                0.0
            } else {
                activity.iter().sum::<f64>() / activity.len() as f64
            };
            Some((
                group.clone(),
                GroupCorrelation {
                    event_correlation: pearson_corr(&activity, &labels),
                    feature_count: columns.len(),
                    avg_activity,
                },
            ))
        })
        .collect()
}

impl LogAnalyzer {
    fn score_timeframe(
        &self,
        dataset: &LogDataset,
        schema: &FeatureSchema,
        events: &[bool],
        timeframe: Timeframe,
    ) -> Option<TimeframeScoring> {
        let sub_schema = schema_for(schema, timeframe);
        let indicator_fields = sub_schema.indicator_fields().count();
        if indicator_fields == 0 {
            log::warn!("⚠️ No {:?} indicator fields, timeframe skipped", timeframe);
            return None;
        }

        let features = FeatureBuilder::build_with_schema(&sub_schema, &dataset.records);
        let (_, _, scoring) = self.fit_scoring(&features, events, sub_schema.clone());
        let validation = validate(&features, events, &self.config().validation, |train, labels| {
            self.fit_scoring(train, labels, sub_schema.clone()).2
        });
        let meets_requirements =
            validation.accuracy >= MIN_TIMEFRAME_ACCURACY && validation.lift >= MIN_TIMEFRAME_LIFT;

        log::info!(
            "🕐 {:?}: {} fields, {} rules, ROC-AUC {:.3}, lift {:.2}x",
            timeframe,
            indicator_fields,
            scoring.rules.len(),
            validation.roc_auc,
            validation.lift
        );

        Some(TimeframeScoring {
            timeframe,
            indicator_fields,
            features: features.width(),
            rules: scoring.rules.len(),
            group_correlations: group_correlations(&features, &sub_schema, events),
            validation,
            meets_requirements,
        })
    }

    /// Отдельные системы для LTF и HTF индикаторов и их сравнение
    pub fn compare_timeframes(
        &self,
        dataset: &LogDataset,
        schema: &FeatureSchema,
        events: &[bool],
    ) -> TimeframeComparison {
        let ltf = self.score_timeframe(dataset, schema, events, Timeframe::Ltf);
        let htf = self.score_timeframe(dataset, schema, events, Timeframe::Htf);

        let (better, roc_auc_difference) = match (&ltf, &htf) {
            (Some(l), Some(h)) => {
                let diff = l.validation.roc_auc - h.validation.roc_auc;
                let better = if diff >= 0.0 { Timeframe::Ltf } else { Timeframe::Htf };
                (Some(better), diff.abs())
            }
            (Some(_), None) => (Some(Timeframe::Ltf), 0.0),
            (None, Some(_)) => (Some(Timeframe::Htf), 0.0),
            (None, None) => (None, 0.0),
        };

        TimeframeComparison {
            ltf,
            htf,
            better,
            roc_auc_difference,
        }
    }
}

impl TimeframeComparison {
    pub fn print(&self) {
        println!("\n🕐 LTF vs HTF:");
        for scoring in [&self.ltf, &self.htf].into_iter().flatten() {
            println!(
                "   {:?}: {} fields, {} rules, ROC-AUC {:.3}, accuracy {:.3}, lift {:.2}x {}",
                scoring.timeframe,
                scoring.indicator_fields,
                scoring.rules,
                scoring.validation.roc_auc,
                scoring.validation.accuracy,
                scoring.validation.lift,
                if scoring.meets_requirements { "✅" } else { "❌" }
            );
        }
        if let Some(better) = self.better {
            println!("   Better: {:?} (ΔROC {:.3})", better, self.roc_auc_difference);
        }
    }
}
