//! Построение признаков по приоритетам
//! 1. поля индикаторов, 2. агрегаты групп, 3. метаданные свечи

pub mod matrix;

pub use matrix::*;

use std::collections::BTreeMap;
use std::slice;

use serde::{Deserialize, Serialize};

use crate::parser::fields::{INDICATOR_GROUPS, METADATA_FIELDS, group_of, split_field_name};
use crate::parser::{LogDataset, LogRecord};

/// Состав признаков, зафиксированный по обучающему логу.
/// Нужен, чтобы новые строки проецировались на те же колонки.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// группа -> поля индикаторов в порядке колонок
    pub groups: BTreeMap<String, Vec<String>>,
    pub signal_fields: Vec<String>,
    pub metadata: Vec<String>,
}

impl FeatureSchema {
    pub fn from_dataset(dataset: &LogDataset) -> Self {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in dataset.field_names() {
            let (prefix, _) = split_field_name(&name);
            if let Some((_, group)) = group_of(prefix) {
                groups.entry(group.to_string()).or_default().push(name);
            }
        }

        let signal_fields = dataset
            .field_names()
            .into_iter()
            .filter(|name| {
                dataset
                    .records
                    .iter()
                    .any(|r| r.fields.get(name).is_some_and(|f| f.value.signal().is_some()))
            })
            .collect();

        let metadata = METADATA_FIELDS
            .iter()
            .filter(|m| dataset.records.iter().any(|r| r.candle.get(m).is_some()))
            .map(|m| m.to_string())
            .collect();

        FeatureSchema {
            groups,
            signal_fields,
            metadata,
        }
    }

    pub fn indicator_fields(&self) -> impl Iterator<Item = &String> {
        INDICATOR_GROUPS
            .iter()
            .filter_map(|(group, _)| self.groups.get(*group))
            .flatten()
    }

    fn has_ohlc(&self) -> bool {
        ["open", "high", "low", "close"]
            .iter()
            .all(|m| self.metadata.iter().any(|x| x == *m))
    }
}

pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Признаки для всего датасета
    pub fn build(dataset: &LogDataset) -> (FeatureMatrix, FeatureSchema) {
        let schema = FeatureSchema::from_dataset(dataset);
        let matrix = Self::build_with_schema(&schema, &dataset.records);
        log::info!(
            "🧮 Built {} features for {} rows",
            matrix.width(),
            matrix.rows()
        );
        (matrix, schema)
    }

    /// Одна строка в колонках схемы
    pub fn build_row(schema: &FeatureSchema, record: &LogRecord) -> FeatureMatrix {
        Self::build_with_schema(schema, slice::from_ref(record))
    }

    pub fn build_with_schema(schema: &FeatureSchema, records: &[LogRecord]) -> FeatureMatrix {
        let rows = records.len();
        let mut matrix = FeatureMatrix::new(rows);

        // Приоритет 1: поля индикаторов
        let mut group_columns: Vec<(&str, Vec<Vec<f64>>)> = Vec::new();
        for (group, _) in INDICATOR_GROUPS.iter() {
            let Some(fields) = schema.groups.get(*group) else {
                continue;
            };
            let mut values_in_group = Vec::with_capacity(fields.len());

            for field in fields {
                let values: Vec<f64> = records
                    .iter()
                    .map(|r| r.field_number(field).unwrap_or(0.0))
                    .collect();
                let active = values
                    .iter()
                    .map(|&v| if v != 0.0 { 1.0 } else { 0.0 })
                    .collect();

                matrix.push_numeric(format!("{field}_ind"), values.clone());
                matrix.push_numeric(format!("{field}_ind_active"), active);

                if schema.signal_fields.contains(field) {
                    let signals = records
                        .iter()
                        .map(|r| {
                            r.fields
                                .get(field)
                                .and_then(|f| f.value.signal())
                                .map(str::to_string)
                        })
                        .collect();
                    matrix.push_categorical(format!("{field}_ind_signal"), signals);
                }
                values_in_group.push(values);
            }
            group_columns.push((*group, values_in_group));
        }

        // Приоритет 2: агрегаты по группам
        for (group, columns) in &group_columns {
            if columns.len() < 2 {
                continue;
            }
            let mut max = Vec::with_capacity(rows);
            let mut mean = Vec::with_capacity(rows);
            let mut active_count = Vec::with_capacity(rows);
            for row in 0..rows {
                let row_values = columns.iter().map(|c| c[row]);
                max.push(row_values.clone().fold(f64::NEG_INFINITY, f64::max));
                mean.push(row_values.clone().sum::<f64>() / columns.len() as f64);
                active_count.push(row_values.filter(|v| *v != 0.0).count() as f64);
            }
            matrix.push_numeric(format!("{group}_ind_max"), max);
            matrix.push_numeric(format!("{group}_ind_mean"), mean);
            matrix.push_numeric(format!("{group}_ind_active_count"), active_count);
        }

        // Приоритет 3: метаданные
        for name in &schema.metadata {
            let values = records
                .iter()
                .map(|r| r.candle.get(name).unwrap_or(0.0))
                .collect();
            matrix.push_numeric(format!("meta_{name}"), values);
        }

        if schema.has_ohlc() {
            let mut price_range = Vec::with_capacity(rows);
            let mut close_position = Vec::with_capacity(rows);
            for r in records {
                let high = r.candle.high.unwrap_or(0.0);
                let low = r.candle.low.unwrap_or(0.0);
                let close = r.candle.close.unwrap_or(0.0);
                price_range.push(high - low);
                close_position.push((close - low) / (high - low + 1e-8));
            }
            matrix.push_numeric("meta_price_range", price_range);
            matrix.push_numeric("meta_close_position", close_position);
        }

        matrix
    }
}
