//! Синтетический лог с известной структурой событий
//! Цена - синусоида с периодом 40 баров: пики и впадины каждые 20 баров (i % 20 == 10)

#![cfg(test)]

use chrono::{DateTime, Duration};

pub const PERIOD: usize = 40;

pub fn is_turning_point(i: usize) -> bool {
    i % 20 == 10
}

pub fn price(i: usize) -> f64 {
    100.0 + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / PERIOD as f64).sin()
}

/// Строка лога для бара `i`.
/// ef2 - высокий на экстремумах, as2 - активируется за 3 бара до них,
/// vc2 - растёт с удалением от экстремума, nw2 - `!!` на экстремумах.
pub fn log_line(i: usize) -> String {
    let base = DateTime::parse_from_rfc3339("2024-08-05T00:00:00.000+03:00").unwrap();
    let ts = (base + Duration::minutes(i as i64)).format("%Y-%m-%dT%H:%M:%S%.3f%:z");

    let close = price(i);
    let open = if i == 0 { close } else { price(i - 1) };
    let high = open.max(close) + 0.1;
    let low = open.min(close) - 0.1;
    let color = if close >= open { "GREEN" } else { "RED" };
    let change = (close - open) / open * 100.0;

    let ef2 = if is_turning_point(i) { 7.5 } else { (i % 7) as f64 * 0.1 };
    let as2 = if i % 20 == 7 { 3.0 } else { (i % 3) as f64 * 0.1 };
    let distance = (i % 20).abs_diff(10) as f64;
    let vc2 = 10.0 + distance;
    let nw2 = if is_turning_point(i) {
        ",nw2-!!".to_string()
    } else if i % 5 == 0 {
        ",nw2-!".to_string()
    } else {
        String::new()
    };
    let ze2 = if i % 2 == 0 { "--1.5" } else { "-2.25" };

    format!(
        "[{ts}]: LTF|event_{i}|1|2024-08-05 00:00|{color}|{change:.2}%|{vol:.1}K|NORMAL|50%|-1.2%_24h|o:{open:.4}|h:{high:.4}|l:{low:.4}|c:{close:.4}|rng:{rng:.4}|p2-0,p5-{p5},ef2-{ef2:.2},as2-{as2:.2},vc2-{vc2:.1},ze2{ze2}{nw2},md1h-{md}%,bs",
        vol = 10.0 + (i % 5) as f64,
        rng = high - low,
        p5 = i % 100,
        md = 40 + i % 10,
    )
}

pub fn synthetic_log(rows: usize) -> String {
    let mut text = String::from("# synthetic indicator log\n");
    for i in 0..rows {
        text.push_str(&log_line(i));
        text.push('\n');
    }
    text
}
