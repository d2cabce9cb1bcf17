//! Специальные функции и функции распределения

const FPMIN: f64 = 1e-30;
const EPS: f64 = 1e-12;
const MAX_ITER: usize = 1000;

// ============================================================================
// Log Gamma (ACM algorithm 291)
// ============================================================================

pub fn lgamma(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }

    let mut x = x;
    let mut result = 0.0;
    if x < 7.0 {
        let mut prod = 1.0;
        while x < 7.0 {
            prod *= x;
            x += 1.0;
        }
        result = -f64::ln(prod);
    }

    let z = 1.0 / (x * x);
    result + (x - 0.5) * x.ln() - x
        + 0.918938533204673
        + (((-0.000595238095238 * z + 0.000793650793651) * z - 0.002777777777778) * z
            + 0.083333333333333)
            / x
}

// ============================================================================
// Regularized lower incomplete gamma P(a, x)
// ============================================================================

pub fn igamma(a: f64, x: f64) -> f64 {
    if x <= 0.0 || a <= 0.0 {
        return 0.0;
    }

    let log_front = a * x.ln() - x - lgamma(a);

    if x < a + 1.0 {
        // ряд
        let mut ap = a;
        let mut del = 1.0 / a;
        let mut sum = del;
        for _ in 0..MAX_ITER {
            ap += 1.0;
            del *= x / ap;
            sum += del;
            if del.abs() < sum.abs() * EPS {
                break;
            }
        }
        return (sum * log_front.exp()).clamp(0.0, 1.0);
    }

    // цепная дробь Лентца
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    (1.0 - h * log_front.exp()).clamp(0.0, 1.0)
}

// ============================================================================
// Regularized incomplete beta I_x(a, b)
// ============================================================================

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

pub fn ibeta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if a <= 0.0 || b <= 0.0 {
        return f64::NAN;
    }

    let log_front = lgamma(a + b) - lgamma(a) - lgamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = log_front.exp();

    let result = if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    };
    result.clamp(0.0, 1.0)
}

// ============================================================================
// Student's t CDF
// ============================================================================

pub fn t_cdf(ndf: usize, t: f64) -> f64 {
    let ndf = ndf as f64;
    let tail = 0.5 * ibeta(0.5 * ndf, 0.5, ndf / (ndf + t * t));
    if t >= 0.0 { 1.0 - tail } else { tail }
}

/// Двусторонний p-value t-статистики
pub fn t_two_sided_pvalue(ndf: usize, t: f64) -> f64 {
    if ndf == 0 || t.is_nan() {
        return 1.0;
    }
    if t.is_infinite() {
        return 0.0;
    }
    let ndf = ndf as f64;
    ibeta(0.5 * ndf, 0.5, ndf / (ndf + t * t)).clamp(0.0, 1.0)
}

/// Хвост хи-квадрат распределения: P(X >= chi2)
pub fn chi2_sf(ndf: usize, chi2: f64) -> f64 {
    if ndf == 0 {
        return 1.0;
    }
    if chi2 <= 0.0 {
        return 1.0;
    }
    (1.0 - igamma(0.5 * ndf as f64, 0.5 * chi2)).clamp(0.0, 1.0)
}
