//! Основной текстовый отчёт статистического анализа

use std::fmt::Write;

use crate::analytics::AnalysisResults;
use crate::analytics::lags::top_lags;
use crate::analytics::veto::top_vetos;

const RULER: &str = "================================================================================";
const MIN_REPORTED_ROC: f64 = 0.55;

pub fn render_text_report(results: &AnalysisResults, companion_files: &[String]) -> String {
    let mut out = String::new();
    // запись в String не падает
    let _ = write_report(&mut out, results, companion_files);
    out
}

fn write_report(
    out: &mut String,
    results: &AnalysisResults,
    companion_files: &[String],
) -> std::fmt::Result {
    writeln!(out, "{RULER}")?;
    writeln!(out, "STATISTICAL ANALYSIS OF INDICATOR LOG")?;
    writeln!(out, "{RULER}")?;
    writeln!(out, "Source:    {}", results.source)?;
    writeln!(out, "Generated: {}", results.scoring.created)?;
    writeln!(out)?;

    writeln!(out, "DATA")?;
    writeln!(out, "  Records:          {}", results.parsing.total_records)?;
    writeln!(out, "  Skipped lines:    {}", results.parsing.skipped_lines)?;
    writeln!(out, "  Indicator fields: {}", results.parsing.indicator_fields)?;
    writeln!(
        out,
        "  LTF / HTF fields: {} / {}",
        results.split.ltf.len(),
        results.split.htf.len()
    )?;
    writeln!(out, "  Features:         {}", results.features.width())?;
    writeln!(
        out,
        "  Parsing quality:  {:.0}% ({:?}), missing critical: {}",
        results.quality.score * 100.0,
        results.quality.level,
        if results.quality.missing.is_empty() {
            "none".to_string()
        } else {
            results.quality.missing.join(", ")
        }
    )?;
    writeln!(out)?;

    writeln!(out, "EVENTS")?;
    writeln!(out, "  Method:       {}", results.events.method)?;
    writeln!(out, "  Price field:  {}", results.events.parameters.price_field_used)?;
    writeln!(
        out,
        "  Total events: {} ({:.2}% of rows)",
        results.events.total_events,
        results.events.event_rate * 100.0
    )?;
    writeln!(
        out,
        "  Volatility threshold: {:.5}",
        results.events.parameters.volatility_threshold
    )?;
    writeln!(out, "  Retracements: {}", results.events.retracements.len())?;
    writeln!(out)?;

    let total = results.correlations.total();
    let significant = results.correlations.significant_count();
    writeln!(out, "CORRELATIONS")?;
    writeln!(out, "  Fields analyzed:     {}", total)?;
    writeln!(
        out,
        "  Significant (p < {}): {} ({:.1}%)",
        results.scoring.significance_level,
        significant,
        if total > 0 { significant as f64 / total as f64 * 100.0 } else { 0.0 }
    )?;
    writeln!(out)?;

    writeln!(out, "TOP FIELDS BY ROC-AUC")?;
    let top_roc = results.correlations.top_by_roc(MIN_REPORTED_ROC, 5);
    if top_roc.is_empty() {
        writeln!(out, "  No fields with ROC-AUC above {}", MIN_REPORTED_ROC)?;
    }
    for (rank, (name, corr)) in top_roc.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<28} ROC-AUC {:.3}  threshold {:.4}  r = {:+.3} (p = {:.4})",
            rank + 1,
            name,
            corr.best_roc_auc.unwrap_or(0.5),
            corr.best_threshold.unwrap_or(0.0),
            corr.pearson_r,
            corr.p_value
        )?;
    }
    writeln!(out)?;

    writeln!(out, "TEMPORAL PREDICTORS")?;
    let lags = top_lags(&results.lags, 5);
    if lags.is_empty() {
        writeln!(out, "  No stable lead times found")?;
    }
    for (rank, (name, lag)) in lags.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<28} mean lag {:.1} bars (median {:.1}, std {:.1}), power {:.1}%",
            rank + 1,
            name,
            lag.mean_lag,
            lag.median_lag,
            lag.std_lag,
            lag.predictive_power * 100.0
        )?;
    }
    writeln!(out)?;

    writeln!(out, "VETO FIELDS")?;
    let vetos = top_vetos(&results.vetos, 3);
    if vetos.is_empty() {
        writeln!(out, "  No significant VETO conditions")?;
    }
    for (rank, (name, veto)) in vetos.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<28} effectiveness {:.1}%, threshold {:.4}, blocks ~{} events (p = {:.4})",
            rank + 1,
            name,
            veto.effectiveness * 100.0,
            veto.threshold,
            veto.events_blocked,
            veto.p_value
        )?;
    }
    writeln!(out)?;

    writeln!(out, "BLOCKING FIELDS")?;
    if results.blocking.is_empty() {
        writeln!(out, "  No fields that suppress the baseline signal")?;
    }
    for (rank, blocker) in results.blocking.iter().take(3).enumerate() {
        writeln!(
            out,
            "  {}. {:<28} strength {:.3}, |value| > {:.4}, false positives {:.1}%",
            rank + 1,
            blocker.field,
            blocker.blocking_strength,
            blocker.threshold,
            blocker.false_positive_rate * 100.0
        )?;
    }
    writeln!(out)?;

    writeln!(out, "MARKET PHASES")?;
    for (name, stats) in &results.phases.statistics {
        writeln!(out, "  {:<28} {:>5} ({:.2}%)", name, stats.count, stats.percentage)?;
    }
    writeln!(out)?;

    writeln!(out, "EXTREMUM PATTERNS")?;
    for (event_type, count) in &results.patterns.type_counts {
        writeln!(out, "  {:<28} {}", event_type, count)?;
    }
    for (comparison, found) in &results.patterns.discriminative {
        if let Some(best) = found.first() {
            writeln!(
                out,
                "  {}: {} discriminators, best {} (power {:.2})",
                comparison,
                found.len(),
                best.indicator,
                best.discriminative_power
            )?;
        }
    }
    writeln!(out)?;

    let v = &results.validation;
    writeln!(out, "VALIDATION ({})", v.method)?;
    writeln!(out, "  ROC-AUC:   {:.3}", v.roc_auc)?;
    writeln!(out, "  Accuracy:  {:.3}", v.accuracy)?;
    writeln!(out, "  Precision: {:.3}", v.precision)?;
    writeln!(out, "  Recall:    {:.3}", v.recall)?;
    writeln!(out, "  Lift:      {:.2}x", v.lift)?;
    writeln!(out, "  Rules:     {} (train {} / test {} rows)", v.features_used, v.train_rows, v.test_rows)?;
    if let Some(note) = &v.note {
        writeln!(out, "  Note: {}", note)?;
    }
    writeln!(out)?;

    writeln!(out, "LTF vs HTF")?;
    for scoring in [&results.timeframes.ltf, &results.timeframes.htf].into_iter().flatten() {
        writeln!(
            out,
            "  {:?}: {} fields, ROC-AUC {:.3}, accuracy {:.3}, lift {:.2}x, requirements {}",
            scoring.timeframe,
            scoring.indicator_fields,
            scoring.validation.roc_auc,
            scoring.validation.accuracy,
            scoring.validation.lift,
            if scoring.meets_requirements { "met" } else { "not met" }
        )?;
    }
    if let Some(better) = results.timeframes.better {
        writeln!(out, "  Better timeframe: {:?}", better)?;
    }
    writeln!(out)?;

    writeln!(out, "METHODOLOGY")?;
    writeln!(out, "  - Events detected automatically from price extrema, retracements and volatility spikes")?;
    writeln!(out, "  - No field is favoured a priori, every feature is tested against the same events")?;
    writeln!(out, "  - Numeric fields: point-biserial correlation and ROC-AUC at quantile thresholds")?;
    writeln!(out, "  - Signal fields: event rate per signal value with chi-square test")?;
    writeln!(out, "  - VETO: percentile conditions that lower the event rate significantly")?;
    writeln!(out, "  - Weights: positive rules sum to 0.8, VETO rules to -0.2")?;
    writeln!(out)?;

    writeln!(out, "FILES")?;
    for file in companion_files {
        writeln!(out, "  - {}", file)?;
    }
    writeln!(out, "{RULER}")?;
    Ok(())
}
