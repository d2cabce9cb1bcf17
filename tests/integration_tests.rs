//! Интеграционные тесты полного пайплайна
//! Лог -> анализ -> файлы результатов -> скоринг новых строк

use std::fs;
use std::path::{Path, PathBuf};

use dslog_analytics::analytics::LogAnalyzer;
use dslog_analytics::config::{AnalyzerConfig, load_config};
use dslog_analytics::parser::{
    analyze_data_quality, clean_log_file, merge_log_files, split_log_file, validate_log_format,
};
use dslog_analytics::report::{MAIN_REPORT, SCORING_CONFIG};
use dslog_analytics::scoring_api::LogScorer;

const ROWS: usize = 600;

/// Синусоида с периодом 40 баров, ef2 и nw2 отмечают экстремумы
fn write_log(dir: &Path) -> PathBuf {
    let mut text = String::from("# indicator log\n");
    for i in 0..ROWS {
        let price = |k: usize| 50000.0 + 1500.0 * (2.0 * std::f64::consts::PI * k as f64 / 40.0).sin();
        let close = price(i);
        let open = if i == 0 { close } else { price(i - 1) };
        let (high, low) = (open.max(close) + 5.0, open.min(close) - 5.0);
        let turning = i % 20 == 10;

        let minutes = i % 60;
        let hours = i / 60;
        let ts = format!("2024-08-05T{:02}:{:02}:00.000+03:00", hours, minutes);
        let ef2 = if turning { "9.1".to_string() } else { format!("{:.2}", (i % 4) as f64 * 0.2) };
        let nw2 = if turning { ",nw2-!!" } else { "" };

        text.push_str(&format!(
            "[{ts}]: LTF|event_{i}|1|2024-08-05 00:00|{}|0.10%|12.5K|NORMAL|40%|-2.0%_24h|o:{open:.1}|h:{high:.1}|l:{low:.1}|c:{close:.1}|rng:{:.1}|p2-0,ef2-{ef2},as2-{:.1},vc2-{},ze2--{:.1}{nw2},cz4h-{}σ,bs\n",
            if close >= open { "GREEN" } else { "RED" },
            high - low,
            (i % 3) as f64,
            10 + (i % 20).abs_diff(10),
            (i % 5) as f64 * 0.5,
            i % 4,
        ));
    }

    let path = dir.join("indicators.log");
    fs::write(&path, text).unwrap();
    path
}

fn analyzer(results_dir: PathBuf, charts: bool) -> LogAnalyzer {
    let mut config = AnalyzerConfig::default();
    config.output.results_dir = results_dir;
    config.output.charts = charts;
    LogAnalyzer::new(config).unwrap()
}

#[test]
fn test_format_validation_and_quality() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());

    let format = validate_log_format(&log).unwrap();
    assert!(format.correct_format, "errors: {:?}", format.errors);
    assert_eq!(format.line_count, ROWS + 1);

    let quality = analyze_data_quality(&log).unwrap();
    assert_eq!(quality.valid_lines, ROWS);
    let temporal = quality.temporal.unwrap();
    assert_eq!(temporal.avg_interval_secs, 60.0);
    assert_eq!(temporal.data_gaps, 0);

    let missing = validate_log_format(&dir.path().join("missing.log")).unwrap();
    assert!(!missing.file_exists);
    assert!(!missing.correct_format);
}

#[test]
fn test_full_analysis_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let results_dir = dir.path().join("results");

    let (results, outcome) = analyzer(results_dir.clone(), false)
        .run_full_analysis(&log)
        .unwrap();

    assert_eq!(results.features.rows(), ROWS);
    assert!(results.events.total_events > 10);
    assert!(!results.scoring.rules.is_empty());
    assert_eq!(outcome.results_dir, results_dir);

    for name in [
        MAIN_REPORT,
        SCORING_CONFIG,
        "real_correlations.json",
        "real_temporal_lags.json",
        "veto_analysis.json",
        "field_statistics.json",
        "events_analysis.json",
        "advanced_events.json",
        "blocking_fields.json",
        "event_patterns.json",
        "ltf_htf_comparison.json",
        "weight_matrix.csv",
        "top_fields.csv",
        "correlation_matrix.csv",
        "veto_effectiveness.csv",
    ] {
        assert!(results_dir.join(name).exists(), "{} not written", name);
    }
    // основной отчёт пишется последним
    assert_eq!(outcome.files_created.last(), Some(&results_dir.join(MAIN_REPORT)));

    let report = fs::read_to_string(results_dir.join(MAIN_REPORT)).unwrap();
    assert!(report.contains("STATISTICAL ANALYSIS OF INDICATOR LOG"));

    let weights = fs::read_to_string(results_dir.join("weight_matrix.csv")).unwrap();
    assert!(weights.starts_with("feature,base_field"));

    // cz4h даёт отдельную HTF систему
    assert!(results.timeframes.ltf.is_some());
    assert!(results.timeframes.htf.is_some());
    let comparison: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(results_dir.join("ltf_htf_comparison.json")).unwrap()).unwrap();
    assert!(comparison["better"].is_string());
}

#[test]
fn test_saved_config_scores_new_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let results_dir = dir.path().join("results");

    analyzer(results_dir.clone(), false)
        .run_full_analysis(&log)
        .unwrap();

    let scorer = LogScorer::from_config(&results_dir.join(SCORING_CONFIG)).unwrap();
    let (scores, summary) = scorer.score_file(&log, 10).unwrap();

    assert_eq!(scores.len(), ROWS);
    assert_eq!(summary.total_lines, ROWS + 1);
    assert!(summary.max_score <= 1.0 && summary.min_score >= 0.0);

    // экстремум получает больше, чем середина склона
    assert!(scores[50].score.score > scores[45].score.score);
}

#[cfg(feature = "charts")]
#[test]
fn test_analysis_with_charts() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let results_dir = dir.path().join("results");

    let (_, outcome) = analyzer(results_dir.clone(), true)
        .run_full_analysis(&log)
        .unwrap();
    assert!(results_dir.join(MAIN_REPORT).exists());
    assert!(outcome.files_created.len() >= 15);
}

#[test]
fn test_clean_split_and_merge_files() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());

    let (cleaned, stats) = clean_log_file(&log, None).unwrap();
    assert_eq!(cleaned, dir.path().join("indicators.cleaned.txt"));
    assert_eq!(stats.cleaned_lines, ROWS);
    assert_eq!(validate_log_format(&cleaned).unwrap().valid_lines, 100);

    let parts = split_log_file(&cleaned, Some(&dir.path().join("parts"))).unwrap();
    assert_eq!(parts.len(), ROWS);
    assert!(parts[0].ends_with("event_0.txt"));

    let merged = dir.path().join("merged.log");
    let merge = merge_log_files(&[parts[5].clone(), parts[3].clone(), parts[3].clone()], &merged).unwrap();
    assert_eq!(merge.total_lines, 3);
    assert_eq!(merge.unique_lines, 2);
    let text = fs::read_to_string(&merged).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].contains("|event_3|"));
    assert!(lines[1].contains("|event_5|"));
}

#[test]
fn test_missing_log_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = analyzer(dir.path().join("results"), false).run_full_analysis(&dir.path().join("nope.log"));
    assert!(result.is_err());
}

#[test]
fn test_bundled_config_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.yaml");
    let config = load_config(&path).unwrap();
    let defaults = AnalyzerConfig::default();

    assert_eq!(config.events.lookback_window, defaults.events.lookback_window);
    assert_eq!(config.events.min_event_gap, defaults.events.min_event_gap);
    assert_eq!(config.advanced_events.retracement_levels, defaults.advanced_events.retracement_levels);
    assert_eq!(config.analysis.max_lag, defaults.analysis.max_lag);
    assert_eq!(config.veto.effectiveness_threshold, defaults.veto.effectiveness_threshold);
    assert_eq!(config.validation.seed, defaults.validation.seed);
    assert_eq!(config.output.results_dir, defaults.output.results_dir);
}
