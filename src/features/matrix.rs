//! Матрица признаков: именованные колонки одинаковой длины

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Подмножество строк в заданном порядке
    pub fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    pub data: ColumnData,
}

impl FeatureColumn {
    pub fn is_categorical(&self) -> bool {
        matches!(self.data, ColumnData::Categorical(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&[Option<String>]> {
        match &self.data {
            ColumnData::Categorical(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    rows: usize,
    columns: Vec<FeatureColumn>,
    index: HashMap<String, usize>,
}

impl FeatureMatrix {
    pub fn new(rows: usize) -> Self {
        FeatureMatrix {
            rows,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.index.get(name).map(|&idx| &self.columns[idx])
    }

    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(FeatureColumn::as_numeric)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .filter_map(|c| c.as_numeric().map(|v| (c.name.as_str(), v)))
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = (&str, &[Option<String>])> {
        self.columns
            .iter()
            .filter_map(|c| c.as_categorical().map(|v| (c.name.as_str(), v)))
    }

    pub fn select_rows(&self, rows: &[usize]) -> FeatureMatrix {
        let mut matrix = FeatureMatrix::new(rows.len());
        for column in &self.columns {
            matrix.push(column.name.clone(), column.data.select(rows));
        }
        matrix
    }

    /// Колонка заменяет существующую с тем же именем
    pub fn push(&mut self, name: impl Into<String>, data: ColumnData) {
        debug_assert_eq!(data.len(), self.rows, "column length mismatch");
        let name = name.into();
        match self.index.get(&name) {
            Some(&idx) => self.columns[idx].data = data,
            None => {
                self.index.insert(name.clone(), self.columns.len());
                self.columns.push(FeatureColumn { name, data });
            }
        }
    }

    pub fn push_numeric(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.push(name, ColumnData::Numeric(values));
    }

    pub fn push_categorical(&mut self, name: impl Into<String>, values: Vec<Option<String>>) {
        self.push(name, ColumnData::Categorical(values));
    }
}
