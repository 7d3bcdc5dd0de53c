//! Outlier detectors over a one-dimensional signal.
//!
//! Every detector returns a mask of the same length as its input, where
//! `true` marks the corresponding value as an outlier. Detectors check their
//! own requirements and reject empty or non-finite signals.

use crate::config::{validate_threshold, DetectorKind, DetectorParams};
use crate::error::{OutlierError, Result};

/// Signature shared by every registered detector.
pub type DetectorFn = fn(&[f64], &DetectorParams) -> Result<Vec<bool>>;

/// Look up the detector implementing `kind`.
pub fn detector_fn(kind: DetectorKind) -> DetectorFn {
    match kind {
        DetectorKind::Std => |signal: &[f64], params: &DetectorParams| {
            std_detector(signal, params.n_stds)
        },
        DetectorKind::Iqr => |signal: &[f64], params: &DetectorParams| {
            iqr_detector(signal, params.iqr_proportion)
        },
    }
}

/// Flag values beyond Tukey fences around the interquartile range.
///
/// With Q1 and Q3 the 25th and 75th percentiles and `IQR = Q3 - Q1`, a value
/// is an outlier when it is above `Q3 + IQR * iqr_proportion` or below
/// `Q1 - IQR * iqr_proportion`.
///
/// # Errors
/// * `InvalidInput` for an empty or non-finite signal
/// * `InvalidOption` if `iqr_proportion` is negative or not finite
pub fn iqr_detector(signal: &[f64], iqr_proportion: f64) -> Result<Vec<bool>> {
    check_signal(signal)?;
    validate_threshold("iqr_proportion", iqr_proportion)?;

    let mut sorted = signal.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - iqr * iqr_proportion;
    let upper = q3 + iqr * iqr_proportion;

    Ok(signal.iter().map(|&v| v < lower || v > upper).collect())
}

/// Flag values further than `n_stds` population standard deviations from the
/// mean. A constant signal has no outliers.
///
/// # Errors
/// * `InvalidInput` for an empty or non-finite signal
/// * `InvalidOption` if `n_stds` is negative or not finite
pub fn std_detector(signal: &[f64], n_stds: f64) -> Result<Vec<bool>> {
    check_signal(signal)?;
    validate_threshold("n_stds", n_stds)?;

    // Zero variance: every value is the mean.
    if signal.iter().all(|&v| v == signal[0]) {
        return Ok(vec![false; signal.len()]);
    }

    let mut scale = 1.0;
    let (mut mean, mut std) = mean_std(signal, scale);
    if !(mean.is_finite() && std.is_finite()) {
        // Squared deviations overflowed: work in units of the largest magnitude.
        scale = signal.iter().fold(0.0_f64, |max, v| max.max(v.abs()));
        (mean, std) = mean_std(signal, scale);
    }

    let thresh = std * n_stds;
    Ok(signal.iter().map(|v| (v / scale - mean).abs() > thresh).collect())
}

/// Population mean and standard deviation of `signal / scale`.
fn mean_std(signal: &[f64], scale: f64) -> (f64, f64) {
    let n = signal.len() as f64;
    let mean = signal.iter().map(|v| v / scale).sum::<f64>() / n;
    let variance = signal.iter().map(|v| (v / scale - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Percentile `p` (0–100) of an ascending slice, interpolating linearly
/// between the two nearest order statistics.
///
/// Returns NaN for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let pos = (p / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn check_signal(signal: &[f64]) -> Result<()> {
    if signal.is_empty() {
        return Err(OutlierError::InvalidInput("empty signal".to_string()));
    }
    if let Some(i) = signal.iter().position(|v| !v.is_finite()) {
        return Err(OutlierError::InvalidInput(format!(
            "signal value {i} is not finite ({})",
            signal[i]
        )));
    }
    Ok(())
}
