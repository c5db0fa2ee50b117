//! Statistical utility functions.

/// Smallest SSE used in likelihood-based scores, so perfect fits stay finite.
const MIN_SSE: f64 = 1e-12;

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the sample standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Sample standard deviation of the finite values, 0 when fewer than two.
pub fn residual_std(residuals: &[f64]) -> f64 {
    let defined: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
    if defined.len() < 2 {
        return 0.0;
    }
    std_dev(&defined)
}

/// Trailing rolling mean; the first `window - 1` points average whatever is available.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

/// Trailing rolling sample standard deviation; windows of one point yield 0.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let sd = std_dev(&values[start..=i]);
            if sd.is_finite() {
                sd
            } else {
                0.0
            }
        })
        .collect()
}

/// Akaike Information Criterion from a Gaussian SSE: `n·ln(SSE/n) + 2k`.
pub fn aic(sse: f64, n: usize, k: usize) -> f64 {
    let n = n.max(1) as f64;
    n * (sse.max(MIN_SSE) / n).ln() + 2.0 * k as f64
}

/// Round to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
