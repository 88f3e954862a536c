//! Time-domain heart-rate variability statistics

use crate::rr::MS_PER_MINUTE;

/// Sample standard deviation of RR intervals (n-1 denominator).
pub fn sdnn(rr: &[f64]) -> Option<f64> {
    if rr.len() < 2 {
        return None;
    }

    let n = rr.len() as f64;
    let mean = rr.iter().sum::<f64>() / n;
    let variance = rr.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Root mean square of successive differences.
pub fn rmssd(rr: &[f64]) -> Option<f64> {
    if rr.len() < 2 {
        return None;
    }

    let sum_sq: f64 = rr.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    Some((sum_sq / (rr.len() - 1) as f64).sqrt())
}

/// Mean instantaneous heart rate (bpm) over the intervals.
pub fn mean_heart_rate(rr: &[f64]) -> Option<f64> {
    if rr.is_empty() {
        return None;
    }
    Some(rr.iter().map(|&v| MS_PER_MINUTE / v).sum::<f64>() / rr.len() as f64)
}
