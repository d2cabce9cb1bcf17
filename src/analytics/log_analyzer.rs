//! Анализатор логов индикаторов
//! Полный пайплайн: парсинг -> признаки -> события -> статистика -> скоринг -> валидация -> отчёты

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analytics::blocking::{BlockingField, find_blocking_fields};
use crate::analytics::correlation::{CorrelationReport, analyze_correlations};
use crate::analytics::field_stats::{FieldStatistics, compute_field_statistics};
use crate::analytics::lags::{LagStats, analyze_temporal_lags};
use crate::analytics::patterns::{PatternAnalysis, analyze_extremum_patterns};
use crate::analytics::scoring::ScoringSystem;
use crate::analytics::timeframes::TimeframeComparison;
use crate::analytics::validation::{ValidationResult, validate};
use crate::analytics::veto::{VetoField, find_veto_fields};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::events::{EventDetector, EventSet, MarketPhases};
use crate::features::{FeatureBuilder, FeatureMatrix, FeatureSchema};
use crate::parser::{LogDataset, LogParser, ParsingQuality, ParsingStatistics, TimeframeSplit};
use crate::report::ReportWriter;

/// Всё, что получено за один прогон анализа
#[derive(Debug, Clone)]
pub struct AnalysisResults {
    pub source: String,
    pub parsing: ParsingStatistics,
    pub quality: ParsingQuality,
    pub split: TimeframeSplit,
    pub features: FeatureMatrix,
    pub events: EventSet,
    pub phases: MarketPhases,
    pub field_stats: BTreeMap<String, FieldStatistics>,
    pub correlations: CorrelationReport,
    pub lags: BTreeMap<String, LagStats>,
    pub vetos: BTreeMap<String, VetoField>,
    pub blocking: Vec<BlockingField>,
    pub patterns: PatternAnalysis,
    pub scoring: ScoringSystem,
    pub validation: ValidationResult,
    pub timeframes: TimeframeComparison,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub results_dir: PathBuf,
    pub files_created: Vec<PathBuf>,
    pub validation: ValidationResult,
}

pub struct LogAnalyzer {
    config: AnalyzerConfig,
    parser: LogParser,
}

impl LogAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        Ok(LogAnalyzer {
            config,
            parser: LogParser::new()?,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Анализ уже распарсенного датасета, без записи файлов
    pub fn analyze_dataset(
        &self,
        dataset: &LogDataset,
        source: &str,
    ) -> Result<AnalysisResults, AnalysisError> {
        let parsing = dataset.parsing_statistics();
        let quality = dataset.validate_parsing_quality();
        let split = dataset.ltf_htf_separation();
        log::info!(
            "📋 Parsing quality {:.0}%, LTF {} / HTF {} fields",
            quality.score * 100.0,
            split.ltf.len(),
            split.htf.len()
        );
        for warning in &parsing.warnings {
            log::warn!("⚠️ {}", warning);
        }

        let (features, schema) = FeatureBuilder::build(dataset);
        if features.width() == 0 {
            return Err(AnalysisError::EmptyFeatures);
        }

        let detector = EventDetector::new(
            self.config.events.clone(),
            self.config.advanced_events.clone(),
        );
        let events = detector.detect(&features)?;
        let phases = detector.detect_phases(&features, &events.retracements);
        let patterns = analyze_extremum_patterns(&features);

        let analysis = &self.config.analysis;
        let field_stats = compute_field_statistics(&features, analysis.min_samples);
        let lags = analyze_temporal_lags(&features, &events.mask, analysis.max_lag);
        let (correlations, vetos, mut scoring) =
            self.fit_scoring(&features, &events.mask, schema.clone());
        let blocking = find_blocking_fields(&features, &events.mask, &self.config.veto);

        let validation = validate(&features, &events.mask, &self.config.validation, |train, labels| {
            self.fit_scoring(train, labels, schema.clone()).2
        });
        scoring.validation_score = Some(validation.roc_auc);
        let timeframes = self.compare_timeframes(dataset, &schema, &events.mask);

        Ok(AnalysisResults {
            source: source.to_string(),
            parsing,
            quality,
            split,
            features,
            events,
            phases,
            field_stats,
            correlations,
            lags,
            vetos,
            blocking,
            patterns,
            scoring,
            validation,
            timeframes,
        })
    }

    /// Корреляции, VETO и скоринговая система по переданным строкам
    pub fn fit_scoring(
        &self,
        features: &FeatureMatrix,
        events: &[bool],
        schema: FeatureSchema,
    ) -> (CorrelationReport, BTreeMap<String, VetoField>, ScoringSystem) {
        let analysis = &self.config.analysis;
        let correlations = analyze_correlations(features, events, analysis.significance_level);
        let vetos = find_veto_fields(features, events, &self.config.veto, analysis.significance_level);

        let event_rate = if events.is_empty() {
            0.0
        } else {
            events.iter().filter(|e| **e).count() as f64 / events.len() as f64
        };
        let scoring = ScoringSystem::build(
            &correlations,
            &vetos,
            event_rate,
            schema,
            analysis.significance_level,
            analysis.min_correlation,
        );
        (correlations, vetos, scoring)
    }

    /// Полный анализ файла с сохранением отчётов
    pub fn run_full_analysis(&self, log_path: &Path) -> Result<(AnalysisResults, AnalysisOutcome), AnalysisError> {
        log::info!("🚀 Starting analysis of {}", log_path.display());

        let dataset = self.parser.parse_file(log_path)?;
        let results = self.analyze_dataset(&dataset, &log_path.display().to_string())?;

        let writer = ReportWriter::new(
            self.config.output.results_dir.clone(),
            self.config.output.charts,
        );
        let files_created = writer.write_all(&results)?;

        let outcome = AnalysisOutcome {
            results_dir: writer.dir().to_path_buf(),
            files_created,
            validation: results.validation.clone(),
        };
        log::info!("🏁 Analysis complete, results in {}", outcome.results_dir.display());
        Ok((results, outcome))
    }
}

impl AnalysisResults {
    pub fn print(&self) {
        self.parsing.print();
        self.events.print();
        self.phases.print();

        println!("\n🔗 Correlations:");
        println!(
            "   {} fields, {} significant",
            self.correlations.total(),
            self.correlations.significant_count()
        );
        for (name, corr) in self.correlations.top_by_roc(0.55, 5) {
            println!(
                "   {:<28} ROC-AUC {:.3} (threshold {:.4})",
                name,
                corr.best_roc_auc.unwrap_or(0.5),
                corr.best_threshold.unwrap_or(0.0)
            );
        }

        println!("\n⏱️ Temporal predictors: {}", self.lags.len());
        println!("🛑 VETO fields: {}", self.vetos.len());
        println!("🧱 Blocking fields: {}", self.blocking.len());
        println!(
            "📐 Extremum events: {} in {} pattern types",
            self.patterns.events.len(),
            self.patterns.patterns.len()
        );
        println!(
            "⚖️ Scoring rules: {} numeric, {} categorical, {} veto",
            self.scoring.feature_breakdown.numeric_features,
            self.scoring.feature_breakdown.categorical_features,
            self.scoring.feature_breakdown.veto_features
        );
        self.validation.print();
        self.timeframes.print();
    }
}
