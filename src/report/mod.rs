//! Сохранение результатов анализа в папку results

#[cfg(feature = "charts")]
pub mod charts;
pub mod tables;
pub mod text;

pub use tables::write_json;
pub use text::render_text_report;

use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::AnalysisResults;
use crate::error::ReportError;

pub const MAIN_REPORT: &str = "statistical_analysis.txt";
pub const SCORING_CONFIG: &str = "scoring_config.json";

pub struct ReportWriter {
    dir: PathBuf,
    charts: bool,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, charts: bool) -> Self {
        ReportWriter {
            dir: dir.into(),
            charts,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Записать все файлы. Возвращает список созданных путей, основной отчёт последним.
    pub fn write_all(&self, results: &AnalysisResults) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(&self.dir)?;
        let mut created = Vec::new();

        let json_files: [(&str, &dyn erased::Json); 10] = [
            ("real_correlations.json", &results.correlations.fields),
            ("real_temporal_lags.json", &results.lags),
            ("veto_analysis.json", &results.vetos),
            ("field_statistics.json", &results.field_stats),
            ("events_analysis.json", &results.events),
            (SCORING_CONFIG, &results.scoring),
            ("advanced_events.json", &results.phases),
            ("blocking_fields.json", &results.blocking),
            ("event_patterns.json", &results.patterns),
            ("ltf_htf_comparison.json", &results.timeframes),
        ];
        for (name, value) in json_files {
            let path = self.dir.join(name);
            value.write_to(&path)?;
            created.push(path);
        }

        let csv_files: [(&str, CsvWriter); 4] = [
            ("weight_matrix.csv", tables::write_weight_matrix),
            ("top_fields.csv", tables::write_top_fields),
            ("correlation_matrix.csv", tables::write_correlation_matrix),
            ("veto_effectiveness.csv", tables::write_veto_effectiveness),
        ];
        for (name, write) in csv_files {
            let path = self.dir.join(name);
            write(&path, results)?;
            created.push(path);
        }

        if self.charts {
            created.extend(self.write_charts(results));
        }

        let names: Vec<String> = created
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        let report_path = self.dir.join(MAIN_REPORT);
        fs::write(&report_path, render_text_report(results, &names))?;
        created.push(report_path);

        log::info!("💾 {} files written to {}", created.len(), self.dir.display());
        Ok(created)
    }

    /// Ошибки графиков только логируются
    #[cfg(feature = "charts")]
    fn write_charts(&self, results: &AnalysisResults) -> Vec<PathBuf> {
        let charts: [(&str, ChartWriter); 3] = [
            ("roc_auc_distribution.svg", charts::roc_distribution),
            ("temporal_analysis.svg", charts::temporal_analysis),
            ("veto_effectiveness.svg", charts::veto_effectiveness),
        ];

        let mut created = Vec::new();
        for (name, draw) in charts {
            let path = self.dir.join(name);
            match draw(results, &path) {
                Ok(()) => created.push(path),
                Err(e) => log::warn!("⚠️ Chart {} not created: {}", name, e),
            }
        }
        created
    }

    #[cfg(not(feature = "charts"))]
    fn write_charts(&self, _results: &AnalysisResults) -> Vec<PathBuf> {
        log::debug!("Charts disabled at build time");
        Vec::new()
    }
}

type CsvWriter = fn(&Path, &AnalysisResults) -> Result<(), ReportError>;

#[cfg(feature = "charts")]
type ChartWriter = fn(&AnalysisResults, &Path) -> Result<(), Box<dyn std::error::Error>>;

mod erased {
    use std::path::Path;

    use serde::Serialize;

    use crate::error::ReportError;

    /// Разнотипные значения в одном списке JSON выгрузок
    pub trait Json {
        fn write_to(&self, path: &Path) -> Result<(), ReportError>;
    }

    impl<T: Serialize> Json for T {
        fn write_to(&self, path: &Path) -> Result<(), ReportError> {
            super::write_json(path, self)
        }
    }
}
