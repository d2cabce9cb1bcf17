//! SVG графики: распределение ROC-AUC, временные лаги, эффективность VETO

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::analytics::AnalysisResults;
use crate::analytics::lags::top_lags;
use crate::analytics::veto::top_vetos;

const SIZE: (u32, u32) = (1200, 700);
const ROC_BINS: usize = 24;

type ChartResult = Result<(), Box<dyn Error>>;

/// Гистограмма лучших ROC-AUC с отметкой 0.5 (случайный уровень)
pub fn roc_distribution(results: &AnalysisResults, path: &Path) -> ChartResult {
    let roc = results.correlations.roc_values();
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (lo, hi) = (0.4, 1.0);
    let width = (hi - lo) / ROC_BINS as f64;
    let mut counts = vec![0usize; ROC_BINS];
    for value in &roc {
        let bin = (((value - lo) / width).floor().max(0.0) as usize).min(ROC_BINS - 1);
        counts[bin] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("ROC-AUC distribution ({} fields)", roc.len()),
            ("sans-serif", 28).into_font(),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0usize..max_count + 1)?;

    chart
        .configure_mesh()
        .x_desc("best ROC-AUC")
        .y_desc("fields")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = lo + i as f64 * width;
        Rectangle::new([(x0, 0), (x0 + width, count)], BLUE.mix(0.6).filled())
    }))?;

    chart
        .draw_series(LineSeries::new(vec![(0.5, 0), (0.5, max_count + 1)], RED.stroke_width(2)))?
        .label("random (0.5)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_bars(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
    color: RGBColor,
) -> ChartResult {
    let max_value = values.iter().copied().fold(0.0_f64, f64::max).max(1e-6) * 1.1;
    let n = labels.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..n as f64, 0.0..max_value)?;

    let formatter = |x: &f64| {
        let idx = x.floor() as usize;
        if (x - x.floor() - 0.5).abs() < 1e-9 {
            labels.get(idx).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n * 2 + 1)
        .x_label_formatter(&formatter)
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        Rectangle::new([(i as f64 + 0.15, 0.0), (i as f64 + 0.85, v)], color.filled())
    }))?;
    Ok(())
}

/// Средний лаг и предсказательная сила, топ-10
pub fn temporal_analysis(results: &AnalysisResults, path: &Path) -> ChartResult {
    let lags = top_lags(&results.lags, 10);
    let labels: Vec<String> = lags.iter().map(|(name, _)| name.to_string()).collect();
    let mean_lags: Vec<f64> = lags.iter().map(|(_, l)| l.mean_lag).collect();
    let power: Vec<f64> = lags.iter().map(|(_, l)| l.predictive_power * 100.0).collect();

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((2, 1));
    draw_bars(&areas[0], "Mean lag before event, bars", &labels, &mean_lags, BLUE)?;
    draw_bars(&areas[1], "Predictive power, %", &labels, &power, GREEN)?;
    root.present()?;
    Ok(())
}

pub fn veto_effectiveness(results: &AnalysisResults, path: &Path) -> ChartResult {
    let vetos = top_vetos(&results.vetos, 10);
    let labels: Vec<String> = vetos.iter().map(|(name, _)| name.to_string()).collect();
    let values: Vec<f64> = vetos.iter().map(|(_, v)| v.effectiveness * 100.0).collect();

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    draw_bars(&root, "VETO effectiveness, %", &labels, &values, RED)?;
    root.present()?;
    Ok(())
}
