//! Тесты аналитики на синтетическом логе
//! События на экстремумах синусоиды, ef2/nw2 совпадают с ними, as2 опережает на 3 бара, vc2 - VETO

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::analytics::blocking::{analyze_blocker, find_blocking_fields};
    use crate::analytics::correlation::{FieldCorrelation, analyze_correlations};
    use crate::analytics::field_stats::{FieldType, compute_field_statistics};
    use crate::analytics::lags::{analyze_temporal_lags, event_lags};
    use crate::analytics::scoring::{
        RuleCondition, RuleKind, ScoringRule, ScoringSystem, normalize_weights,
    };
    use crate::analytics::timeframes::{group_correlations, schema_for};
    use crate::analytics::validation::{best_threshold, stratified_split, validate};
    use crate::analytics::veto::{VetoDirection, find_veto_fields};
    use crate::analytics::{AnalysisResults, LogAnalyzer};
    use crate::config::{AnalyzerConfig, ValidationConfig, VetoConfig, load_config};
    use crate::error::{AnalysisError, ScoringError};
    use crate::events::{
        EventDetector, EventSet, ExtremumKind, classify_level, detect_retracements,
    };
    use crate::features::{FeatureBuilder, FeatureMatrix, FeatureSchema};
    use crate::parser::{LogParser, Timeframe};
    use crate::scoring_api::{LogScorer, ScoringSummary};
    use crate::tests::fixtures;

    const ROWS: usize = 800;

    fn config() -> AnalyzerConfig {
        let mut config = AnalyzerConfig::default();
        // только экстремумы, чтобы события были предсказуемы
        config.events.include_retracements = false;
        config.output.charts = false;
        config
    }

    fn prepared(rows: usize) -> (FeatureMatrix, FeatureSchema, EventSet) {
        let dataset = LogParser::new()
            .unwrap()
            .parse_str(&fixtures::synthetic_log(rows))
            .unwrap();
        let (features, schema) = FeatureBuilder::build(&dataset);
        let cfg = config();
        let events = EventDetector::new(cfg.events, cfg.advanced_events)
            .detect(&features)
            .unwrap();
        (features, schema, events)
    }

    fn analyzed() -> AnalysisResults {
        let dataset = LogParser::new()
            .unwrap()
            .parse_str(&fixtures::synthetic_log(ROWS))
            .unwrap();
        LogAnalyzer::new(config())
            .unwrap()
            .analyze_dataset(&dataset, "synthetic")
            .unwrap()
    }

    fn rule(feature: &str, importance: f64) -> ScoringRule {
        ScoringRule {
            feature: feature.to_string(),
            base_field: feature.to_string(),
            kind: if importance < 0.0 { RuleKind::Veto } else { RuleKind::Numeric },
            condition: RuleCondition::Above { threshold: 0.0 },
            importance,
            weight: 0.0,
            weight_source: "test".to_string(),
            roc_auc: None,
            effectiveness: None,
            p_value: None,
            significant: true,
        }
    }

    #[test]
    fn test_feature_columns_by_priority() {
        let (features, _, _) = prepared(100);

        assert_eq!(features.rows(), 100);
        let ef2 = features.numeric("ef2_ind").unwrap();
        assert_eq!(ef2[10], 7.5);
        assert_eq!(features.numeric("ef2_ind_active").unwrap()[0], 0.0);
        assert_eq!(features.numeric("ze2_ind").unwrap()[0], -1.5);
        assert_eq!(features.numeric("nw2_ind").unwrap()[10], 2.0);

        let signals = features.column("nw2_ind_signal").unwrap().as_categorical().unwrap();
        assert_eq!(signals[10].as_deref(), Some("!!"));
        assert_eq!(signals[1], None);

        // агрегаты только для групп из 2+ полей
        assert!(features.numeric("group_4_ind_max").is_some());
        assert!(features.numeric("group_4_ind_active_count").is_some());
        assert!(features.numeric("group_1_ind_max").is_none());

        assert!(features.numeric("meta_close").is_some());
        let position = features.numeric("meta_close_position").unwrap();
        assert!(position.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_schema_projects_single_line() {
        let (features, schema, _) = prepared(100);
        let record = LogParser::new()
            .unwrap()
            .line_parser()
            .parse_line(&fixtures::log_line(1), 1)
            .unwrap();

        let single = FeatureBuilder::build_row(&schema, &record);
        assert_eq!(single.rows(), 1);
        assert_eq!(single.width(), features.width());
        assert_eq!(single.numeric("nw2_ind").unwrap()[0], 0.0);
    }

    #[test]
    fn test_field_statistics() {
        let (features, _, _) = prepared(100);

        let stats = compute_field_statistics(&features, 10);
        let ef2 = &stats["ef2_ind"];
        assert_eq!(ef2.field_type, FieldType::Numeric);
        assert_eq!(ef2.total_observations, 100);
        assert_eq!(ef2.numeric.as_ref().unwrap().max, 7.5);

        let signal = &stats["nw2_ind_signal"];
        assert_eq!(signal.field_type, FieldType::Categorical);
        assert_eq!(signal.most_frequent.as_deref(), Some("!"));

        assert!(compute_field_statistics(&features, 1000).is_empty());
    }

    #[test]
    fn test_events_at_turning_points() {
        let (_, _, events) = prepared(ROWS);

        let expected: Vec<usize> = (30..=770).step_by(20).collect();
        assert_eq!(events.event_indices, expected);
        assert_eq!(events.total_events, expected.len());
        assert_eq!(events.volatility_candidates, 0);
        assert!(events.mask[50] && !events.mask[51]);
        assert_eq!(events.parameters.price_field_used, "meta_close");
    }

    #[test]
    fn test_events_need_enough_prices() {
        let dataset = LogParser::new()
            .unwrap()
            .parse_str(&fixtures::synthetic_log(10))
            .unwrap();
        let (features, _) = FeatureBuilder::build(&dataset);
        let cfg = config();
        let result = EventDetector::new(cfg.events, cfg.advanced_events).detect(&features);
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientData { found: 10, required: 20 })
        ));
    }

    #[test]
    fn test_min_event_gap() {
        assert_eq!(EventDetector::apply_min_gap(&[1, 3, 8, 9, 20], 5), vec![1, 8, 20]);
        assert_eq!(EventDetector::apply_min_gap(&[], 5), Vec::<usize>::new());
    }

    #[test]
    fn test_retracement_after_peak() {
        let (highs, lows) = peak_then_dip();
        let retracements = detect_retracements(&highs, &lows, &config().advanced_events);
        let from_peak = retracements
            .iter()
            .find(|r| r.extremum_index == 30)
            .expect("retracement from the peak");
        assert_eq!(from_peak.extremum_kind, ExtremumKind::High);
        assert_eq!(from_peak.level, 10);
        assert_eq!(from_peak.max_index, 60);
        assert_eq!(from_peak.end_index, 61);
    }

    /// Рост до 110, падение до 95, снова рост
    fn peak_then_dip() -> (Vec<f64>, Vec<f64>) {
        let prices: Vec<f64> = (0..=90)
            .map(|i| {
                let i = i as f64;
                if i <= 30.0 {
                    100.0 + i / 3.0
                } else if i <= 60.0 {
                    110.0 - (i - 30.0) * 0.5
                } else {
                    95.0 + (i - 60.0) * 0.5
                }
            })
            .collect();
        let highs: Vec<f64> = prices.iter().map(|p| p + 0.5).collect();
        let lows: Vec<f64> = prices.iter().map(|p| p - 0.5).collect();
        (highs, lows)
    }

    #[test]
    fn test_retracement_levels() {
        let defaults = [2, 3, 5, 7, 10];
        assert_eq!(classify_level(14.5, &defaults), Some(10));
        assert_eq!(classify_level(7.5, &defaults), Some(7));
        assert_eq!(classify_level(5.0, &defaults), Some(5));
        assert_eq!(classify_level(3.2, &defaults), Some(3));
        assert_eq!(classify_level(2.1, &defaults), Some(2));
        assert_eq!(classify_level(1.5, &defaults), None);
        // порядок в конфиге не важен
        assert_eq!(classify_level(6.0, &[8, 4]), Some(4));
    }

    #[test]
    fn test_custom_retracement_levels() {
        let (highs, lows) = peak_then_dip();
        let mut advanced = config().advanced_events;
        advanced.retracement_levels = vec![4, 8];

        let retracements = detect_retracements(&highs, &lows, &advanced);
        let from_peak = retracements
            .iter()
            .find(|r| r.extremum_index == 30)
            .expect("retracement from the peak");
        assert_eq!(from_peak.level, 8);
        assert!(retracements.iter().all(|r| r.level == 4 || r.level == 8));
    }

    #[test]
    fn test_correlations_find_predictive_fields() {
        let (features, _, events) = prepared(ROWS);
        let report = analyze_correlations(&features, &events.mask, 0.05);

        let ef2 = report.fields["ef2_ind"].as_numeric().unwrap();
        assert!(ef2.best_roc_auc.unwrap() > 0.95);
        assert!(ef2.significant);
        assert!(ef2.pearson_r > 0.5);

        let FieldCorrelation::Categorical(nw2) = &report.fields["nw2_ind_signal"] else {
            panic!("nw2 signal must be categorical");
        };
        assert_eq!(nw2.best_signal.as_deref(), Some("!!"));
        let strong = &nw2.signals["!!"];
        assert_eq!(strong.count, 40);
        assert_eq!(strong.events_when_signal, 38);
        assert!(strong.significant);

        assert!(report.top_by_roc(0.55, 5).iter().any(|(name, _)| *name == "ef2_ind"));
    }

    #[test]
    fn test_lag_before_events() {
        let (features, _, events) = prepared(ROWS);
        let lags = analyze_temporal_lags(&features, &events.mask, 20);

        let as2 = &lags["as2_ind"];
        assert_eq!(as2.mean_lag, 3.0);
        assert_eq!(as2.min_lag, 3);
        assert_eq!(as2.samples, events.total_events);
        assert_eq!(as2.predictive_power, 1.0);
    }

    #[test]
    fn test_event_lags_use_closest_prior_activation() {
        let lags = event_lags(&[2, 5, 30], &[8, 31, 60], 10);
        assert_eq!(lags, vec![3, 1]);
    }

    #[test]
    fn test_veto_far_from_events() {
        let (features, _, events) = prepared(ROWS);
        let vetos = find_veto_fields(&features, &events.mask, &VetoConfig::default(), 0.05);

        let vc2 = &vetos["vc2_ind_high"];
        assert_eq!(vc2.direction, VetoDirection::High);
        assert_eq!(vc2.veto_event_rate, 0.0);
        assert!((vc2.effectiveness - 1.0).abs() < 1e-12);
        assert!(vc2.significant);
        assert!(vc2.anticorrelation < 0.0);
        // ближе к событиям vc2 мал, нижний хвост не блокирует
        assert!(!vetos.contains_key("vc2_ind_low"));
    }

    #[test]
    fn test_veto_requires_anticorrelation() {
        let (features, _, events) = prepared(ROWS);
        let strict = VetoConfig {
            min_anticorrelation: -0.9,
            ..VetoConfig::default()
        };
        let vetos = find_veto_fields(&features, &events.mask, &strict, 0.05);
        assert!(vetos.values().all(|v| v.anticorrelation <= -0.9));
        assert!(!vetos.contains_key("vc2_ind_high"));
    }

    #[test]
    fn test_normalize_weights() {
        let mut rules = vec![rule("a", 0.3), rule("b", 0.1), rule("c", -0.5), rule("d", 0.0)];
        normalize_weights(&mut rules);

        assert!((rules[0].weight - 0.6).abs() < 1e-12);
        assert!((rules[1].weight - 0.2).abs() < 1e-12);
        assert!((rules[2].weight + 0.2).abs() < 1e-12);
        assert_eq!(rules[3].weight, 0.0);
    }

    #[test]
    fn test_normalize_veto_only_keeps_importance() {
        let mut rules = vec![rule("v1", -0.05), rule("v2", -0.15)];
        normalize_weights(&mut rules);

        assert_eq!(rules[0].weight, -0.05);
        assert_eq!(rules[1].weight, -0.15);
    }

    #[test]
    fn test_breakdown_counts_only_kept_rules() {
        let results = analyzed();
        let mut correlations = results.correlations.clone();
        // сигнал, который встречается только вне событий, получает нулевую важность
        let Some(FieldCorrelation::Categorical(nw2)) = correlations.fields.get_mut("nw2_ind_signal")
        else {
            panic!("nw2 signal must be categorical");
        };
        for stats in nw2.signals.values_mut() {
            stats.effectiveness = 0.0;
        }

        let system = ScoringSystem::build(
            &correlations,
            &results.vetos,
            results.events.event_rate,
            results.scoring.schema.clone(),
            0.05,
            0.05,
        );
        let count = |kind| system.rules.iter().filter(|r| r.kind == kind).count();

        assert_eq!(system.feature_breakdown.categorical_features, 0);
        assert_eq!(system.feature_breakdown.categorical_features, count(RuleKind::Categorical));
        assert_eq!(system.feature_breakdown.numeric_features, count(RuleKind::Numeric));
        assert_eq!(system.feature_breakdown.veto_features, count(RuleKind::Veto));
    }

    #[test]
    fn test_scoring_system_weights_and_scores() {
        let results = analyzed();
        let system = &results.scoring;

        let positive: f64 = system.rules.iter().map(|r| r.weight).filter(|w| *w > 0.0).sum();
        let negative: f64 = system.rules.iter().map(|r| r.weight).filter(|w| *w < 0.0).sum();
        assert!((positive - 0.8).abs() < 1e-9);
        assert!((negative + 0.2).abs() < 1e-9);
        assert!(system.rules.iter().all(|r| r.weight != 0.0));

        assert!(system.rules.iter().any(|r| {
            r.kind == RuleKind::Categorical
                && r.condition == RuleCondition::SignalEquals { signal: "!!".to_string() }
        }));
        assert!(system.rules.iter().any(|r| r.kind == RuleKind::Veto));

        let mut event_scores = Vec::new();
        let mut other_scores = Vec::new();
        for row in 0..results.features.rows() {
            let score = system.score_row(&results.features, row);
            assert!((0.0..=1.0).contains(&score.score));
            assert!(score.confidence <= 1.0);
            if results.events.mask[row] {
                event_scores.push(score.score);
            } else {
                other_scores.push(score.score);
            }
        }
        let avg = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        assert!(avg(&event_scores) > avg(&other_scores));
    }

    #[test]
    fn test_scoring_config_round_trip() {
        let results = analyzed();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoring_config.json");

        results.scoring.save(&path).unwrap();
        let loaded = ScoringSystem::load(&path).unwrap();
        assert_eq!(loaded.rules.len(), results.scoring.rules.len());
        for (a, b) in loaded.rules.iter().zip(&results.scoring.rules) {
            assert_eq!(a.feature, b.feature);
            assert_eq!(a.kind, b.kind);
            assert!((a.weight - b.weight).abs() < 1e-12);
        }
        assert_eq!(loaded.schema, results.scoring.schema);
        assert!(loaded.validation_score.is_some());

        assert!(matches!(
            ScoringSystem::load(&dir.path().join("missing.json")),
            Err(ScoringError::Io { .. })
        ));
    }

    #[test]
    fn test_stratified_split() {
        let labels: Vec<bool> = (0..100).map(|i| i % 10 == 0).collect();
        let (train, test) = stratified_split(&labels, 0.3, 42);

        assert_eq!(train.len() + test.len(), 100);
        assert_eq!(test.iter().filter(|&&i| labels[i]).count(), 3);
        assert_eq!(test.len(), 30);
        assert!(test.iter().all(|i| !train.contains(i)));

        // фиксированный seed даёт то же разбиение
        assert_eq!(stratified_split(&labels, 0.3, 42), (train, test));
    }

    #[test]
    fn test_best_threshold_youden() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [false, false, true, true];
        assert_eq!(best_threshold(&scores, &labels), 0.8);
    }

    #[test]
    fn test_validation_holdout() {
        let results = analyzed();
        let validation = &results.validation;

        assert_eq!(validation.method, "stratified_holdout");
        assert!(validation.note.is_none());
        assert_eq!(validation.train_rows + validation.test_rows, ROWS);
        assert!(validation.roc_auc > 0.8, "roc = {}", validation.roc_auc);
        assert_eq!(results.scoring.validation_score, Some(validation.roc_auc));
    }

    #[test]
    fn test_validation_falls_back_to_in_sample() {
        let results = analyzed();
        let rows = 10;
        let record_rows: Vec<_> = LogParser::new()
            .unwrap()
            .parse_str(&fixtures::synthetic_log(rows))
            .unwrap()
            .records;
        let features = FeatureBuilder::build_with_schema(&results.scoring.schema, &record_rows);
        let mut events = vec![false; rows];
        events[3] = true;

        let validation = validate(&features, &events, &ValidationConfig::default(), |_, _| {
            results.scoring.clone()
        });
        assert_eq!(validation.method, "in_sample");
        assert!(validation.note.is_some());
        assert_eq!(validation.test_rows, rows);
    }

    #[test]
    fn test_validation_fits_on_train_rows_only() {
        let (features, schema, events) = prepared(ROWS);
        let analyzer = LogAnalyzer::new(config()).unwrap();
        let validation_config = ValidationConfig::default();
        let (train, test) = stratified_split(
            &events.mask,
            validation_config.test_fraction,
            validation_config.seed,
        );

        let mut seen: Option<(Vec<f64>, Vec<bool>)> = None;
        let validation = validate(&features, &events.mask, &validation_config, |rows, labels| {
            seen = Some((rows.numeric("meta_close").unwrap().to_vec(), labels.to_vec()));
            analyzer.fit_scoring(rows, labels, schema.clone()).2
        });

        let (closes, labels) = seen.expect("fit called");
        let all_closes = features.numeric("meta_close").unwrap();
        let expected_closes: Vec<f64> = train.iter().map(|&i| all_closes[i]).collect();
        let expected_labels: Vec<bool> = train.iter().map(|&i| events.mask[i]).collect();
        assert_eq!(closes, expected_closes);
        assert_eq!(labels, expected_labels);
        assert_eq!(validation.train_rows, train.len());
        assert_eq!(validation.test_rows, test.len());
    }

    #[test]
    fn test_log_scorer_lines() {
        let results = analyzed();
        let scorer = LogScorer::new(results.scoring).unwrap();

        let scored = scorer.score_line(&fixtures::log_line(50), 50).unwrap();
        assert!(scored.score.score > 0.0);
        assert!(scored.timestamp.is_some());
        assert!(matches!(
            scorer.score_line("# comment", 0),
            Err(ScoringError::UnparsableLine)
        ));

        let text = format!("# header\n{}\n\n{}\n", fixtures::log_line(50), fixtures::log_line(45));
        let (total, scores) = scorer.score_lines(text.lines());
        assert_eq!(total, 4);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].line_number, 1);

        let summary = ScoringSummary::from_scores(total, &scores, 1);
        assert_eq!(summary.valid_lines, 2);
        assert!(summary.top_lines.len() <= 1);
        assert!(summary.max_score >= summary.min_score);
    }

    #[test]
    fn test_log_scorer_file() {
        let results = analyzed();
        let scorer = LogScorer::new(results.scoring).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", fixtures::synthetic_log(60)).unwrap();

        let (scores, summary) = scorer.score_file(file.path(), 5).unwrap();
        assert_eq!(scores.len(), 60);
        assert_eq!(summary.total_lines, 61);
        assert!(summary.top_lines.len() <= 5);
        assert!(summary.avg_confidence <= 1.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ScoringSummary::from_scores(3, &[], 10);
        assert_eq!(summary.total_lines, 3);
        assert_eq!(summary.valid_lines, 0);
    }

    #[test]
    fn test_config_partial_yaml() {
        let config = AnalyzerConfig::from_yaml_str(
            "events:\n  lookback_window: 10\nveto:\n  effectiveness_threshold: 0.5\n",
        )
        .unwrap();
        assert_eq!(config.events.lookback_window, 10);
        assert_eq!(config.events.min_event_gap, 5);
        assert_eq!(config.veto.effectiveness_threshold, 0.5);
        assert_eq!(config.analysis.significance_level, 0.05);
        assert_eq!(config.advanced_events.retracement_levels, vec![2, 3, 5, 7, 10]);

        assert_eq!(AnalyzerConfig::from_yaml_str("").unwrap().analysis.max_lag, 20);
        assert!(AnalyzerConfig::from_yaml_str("events: [1, 2").is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.validation.seed, 42);
        assert!(config.events.include_retracements);
    }

    /// events каждые 20 строк; blocker = 5 на i % 4 == 1, где базовый сигнал ложно срабатывает в половине случаев
    fn blocking_matrix() -> (FeatureMatrix, Vec<bool>) {
        const N: usize = 200;
        let events: Vec<bool> = (0..N).map(|i| i % 20 == 0).collect();
        let mut features = FeatureMatrix::new(N);
        features.push_numeric(
            "blocker",
            (0..N).map(|i| if i % 4 == 1 { 5.0 } else { 0.01 * (i % 3) as f64 }).collect(),
        );
        for k in 1..=5 {
            let values = (0..N)
                .map(|i| if events[i] || i % 8 == 1 { 1.0 } else { 0.0 })
                .collect();
            features.push_numeric(format!("other{k}"), values);
        }
        (features, events)
    }

    #[test]
    fn test_blocker_lowers_baseline_accuracy() {
        let (features, events) = blocking_matrix();
        let blocker = analyze_blocker(&features, "blocker", &events).expect("blocker found");

        assert_eq!(blocker.field, "blocker");
        assert!((blocker.threshold - 0.02).abs() < 1e-12);
        assert_eq!(blocker.activations, 50);
        assert_eq!(blocker.accuracy_with_field, 0.5);
        assert_eq!(blocker.accuracy_without_field, 1.0);
        assert_eq!(blocker.blocking_strength, 0.5);
        assert_eq!(blocker.false_positive_rate, 0.5);

        assert!(analyze_blocker(&features, "missing", &events).is_none());
    }

    #[test]
    fn test_blocking_fields_sorted_and_limited() {
        let (features, events) = blocking_matrix();
        let mut config = VetoConfig::default();

        let blockers = find_blocking_fields(&features, &events, &config);
        assert!(!blockers.is_empty());
        assert!(blockers.iter().all(|b| b.blocking_strength > config.min_blocking_strength));
        assert!(
            blockers
                .windows(2)
                .all(|w| w[0].blocking_strength >= w[1].blocking_strength)
        );

        config.max_blocking_fields = 1;
        assert_eq!(find_blocking_fields(&features, &events, &config).len(), 1);

        assert!(find_blocking_fields(&features, &[false; 200], &config).is_empty());
    }

    #[test]
    fn test_schema_split_by_timeframe() {
        let (_, schema, _) = prepared(100);

        let htf = schema_for(&schema, Timeframe::Htf);
        assert_eq!(htf.indicator_fields().cloned().collect::<Vec<_>>(), vec!["md1h"]);
        assert!(htf.signal_fields.is_empty());
        assert_eq!(htf.metadata, schema.metadata);

        let ltf = schema_for(&schema, Timeframe::Ltf);
        assert_eq!(ltf.signal_fields, vec!["nw2"]);
        assert!(ltf.indicator_fields().all(|f| f != "md1h"));
        assert!(ltf.indicator_fields().any(|f| f == "ef2"));
    }

    #[test]
    fn test_group_correlation_with_events() {
        let events: Vec<bool> = (0..50).map(|i| i % 5 == 0).collect();
        let mut features = FeatureMatrix::new(50);
        features.push_numeric("ef2_ind", events.iter().map(|&e| if e { -2.0 } else { 0.0 }).collect());
        let schema = FeatureSchema {
            groups: [("group_4".to_string(), vec!["ef2".to_string()])].into(),
            ..Default::default()
        };

        let groups = group_correlations(&features, &schema, &events);
        let group = &groups["group_4"];
        assert!((group.event_correlation - 1.0).abs() < 1e-12);
        assert_eq!(group.feature_count, 1);
        assert!((group.avg_activity - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_analysis_compares_timeframes() {
        let results = analyzed();
        let ltf = results.timeframes.ltf.as_ref().expect("LTF scoring");
        let htf = results.timeframes.htf.as_ref().expect("HTF scoring");
        assert_eq!(htf.indicator_fields, 1);
        assert!(ltf.indicator_fields > htf.indicator_fields);
        assert!(ltf.validation.roc_auc > 0.8, "roc = {}", ltf.validation.roc_auc);

        let diff = ltf.validation.roc_auc - htf.validation.roc_auc;
        let expected = if diff >= 0.0 { Timeframe::Ltf } else { Timeframe::Htf };
        assert_eq!(results.timeframes.better, Some(expected));
        assert!((results.timeframes.roc_auc_difference - diff.abs()).abs() < 1e-12);

        assert_eq!(results.phases.total_records, ROWS);
        assert!(results.blocking.len() <= config().veto.max_blocking_fields);
    }
}
