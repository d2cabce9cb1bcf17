//! Описательная статистика по срезам f64

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Выборочное стандартное отклонение (ddof = 1)
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    var.sqrt()
}

/// Стандартное отклонение генеральной совокупности (ddof = 0)
pub fn population_std(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}

pub fn min_max(data: &[f64]) -> (f64, f64) {
    data.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
}

pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Квантиль отсортированного среза с линейной интерполяцией
pub fn find_quantile(sorted_data: &[f64], fractile: f64) -> f64 {
    if sorted_data.is_empty() {
        return f64::NAN;
    }
    let pos = fractile.clamp(0.0, 1.0) * (sorted_data.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted_data[lower] + (sorted_data[upper] - sorted_data[lower]) * frac
}

pub fn quantile(data: &[f64], fractile: f64) -> f64 {
    find_quantile(&sorted(data), fractile)
}

pub fn median(data: &[f64]) -> f64 {
    quantile(data, 0.5)
}

/// Ранги с усреднением одинаковых значений (1-based)
pub fn average_ranks(data: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; data.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && data[order[j + 1]] == data[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

pub fn count_unique(data: &[f64]) -> usize {
    let sorted = sorted(data);
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Процентное изменение соседних значений; нулевая база даёт 0
pub fn pct_change(data: &[f64]) -> Vec<f64> {
    data.windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect()
}
