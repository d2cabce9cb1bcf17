//! Корреляции, хи-квадрат и ROC-AUC

use serde::{Deserialize, Serialize};

use crate::stats::descriptive::average_ranks;
use crate::stats::distributions::{chi2_sf, t_two_sided_pvalue};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTest {
    pub r: f64,
    pub p_value: f64,
}

impl CorrelationTest {
    pub const NONE: CorrelationTest = CorrelationTest { r: 0.0, p_value: 1.0 };
}

/// Коэффициент Пирсона. Вырожденные данные дают 0.
pub fn pearson_corr(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Пирсон с двусторонним p-value (t-распределение, n - 2 степеней свободы)
pub fn pearson(x: &[f64], y: &[f64]) -> CorrelationTest {
    let n = x.len().min(y.len());
    if n < 3 {
        return CorrelationTest::NONE;
    }
    let r = pearson_corr(x, y);
    if r == 0.0 {
        return CorrelationTest::NONE;
    }

    let ndf = n - 2;
    let denom = 1.0 - r * r;
    let p_value = if denom <= 0.0 {
        0.0
    } else {
        let t = r * (ndf as f64 / denom).sqrt();
        t_two_sided_pvalue(ndf, t)
    };
    CorrelationTest { r, p_value }
}

/// Точечно-бисериальная корреляция: Пирсон против бинарной метки
pub fn point_biserial(values: &[f64], labels: &[bool]) -> CorrelationTest {
    let binary: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
    pearson(values, &binary)
}

pub fn spearman(x: &[f64], y: &[f64]) -> CorrelationTest {
    pearson(&average_ranks(x), &average_ranks(y))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareTest {
    pub chi2: f64,
    pub p_value: f64,
    pub cramer_v: f64,
}

/// Хи-квадрат для таблицы 2x2 с поправкой Йейтса.
/// `table[i][j]`: i - условие (нет/да), j - событие (нет/да).
/// Пустая строка или столбец дают p = 1.
pub fn chi_square_2x2(table: [[u64; 2]; 2]) -> ChiSquareTest {
    let row = [table[0][0] + table[0][1], table[1][0] + table[1][1]];
    let col = [table[0][0] + table[1][0], table[0][1] + table[1][1]];
    let total = (row[0] + row[1]) as f64;

    let degenerate = ChiSquareTest {
        chi2: 0.0,
        p_value: 1.0,
        cramer_v: 0.0,
    };
    if total == 0.0 || row.contains(&0) || col.contains(&0) {
        return degenerate;
    }

    let mut chi2 = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let expected = row[i] as f64 * col[j] as f64 / total;
            let diff = (table[i][j] as f64 - expected).abs();
            let corrected = (diff - 0.5).max(0.0);
            chi2 += corrected * corrected / expected;
        }
    }

    ChiSquareTest {
        chi2,
        p_value: chi2_sf(1, chi2),
        cramer_v: (chi2 / total).sqrt(),
    }
}

/// Таблица сопряжённости условия и событий
pub fn contingency_2x2(condition: &[bool], events: &[bool]) -> [[u64; 2]; 2] {
    let mut table = [[0u64; 2]; 2];
    for (&c, &e) in condition.iter().zip(events) {
        table[usize::from(c)][usize::from(e)] += 1;
    }
    table
}

/// ROC-AUC через ранги (статистика Манна-Уитни), ничьи считаются как 0.5.
/// `None`, если в метках один класс.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    let n = scores.len().min(labels.len());
    let n_pos = labels[..n].iter().filter(|&&l| l).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let ranks = average_ranks(&scores[..n]);
    let rank_sum: f64 = ranks
        .iter()
        .zip(&labels[..n])
        .filter(|(_, l)| **l)
        .map(|(r, _)| r)
        .sum();

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn from_predictions(predicted: &[bool], actual: &[bool]) -> Self {
        let mut counts = ConfusionCounts::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p, a) {
                (true, true) => counts.tp += 1,
                (true, false) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (false, true) => counts.fn_ += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.tp + self.tn) as f64 / self.total() as f64
    }

    /// TP / max(1, предсказанные положительные)
    pub fn precision(&self) -> f64 {
        self.tp as f64 / (self.tp + self.fp).max(1) as f64
    }

    /// TP / max(1, реальные положительные)
    pub fn recall(&self) -> f64 {
        self.tp as f64 / (self.tp + self.fn_).max(1) as f64
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.fp as f64 / (self.fp + self.tn).max(1) as f64
    }
}
