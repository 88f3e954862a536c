//! RR interval conversion and ectopic filtering
//!
//! Heart-rate samples are converted to beat-to-beat intervals and cleaned of
//! abrupt jumps before any variability measure is taken:
//! - Non-positive bpm readings are dropped
//! - Adjacent intervals whose relative change exceeds the noise threshold are
//!   both discarded

use crate::types::HeartRateSample;
use serde::{Deserialize, Serialize};

/// Milliseconds per minute, used for bpm <-> RR conversion
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Default relative change above which an interval pair is treated as ectopic
pub const DEFAULT_ECTOPIC_THRESHOLD: f64 = 0.20;

/// Default minimum number of valid intervals for window metrics
pub const DEFAULT_MIN_RR_INTERVALS: usize = 5;

/// Convert heart-rate samples to RR intervals (ms), dropping malformed readings.
pub fn to_rr_intervals(samples: &[HeartRateSample]) -> Vec<f64> {
    samples
        .iter()
        .filter(|s| s.bpm > 0.0 && s.bpm.is_finite())
        .map(|s| MS_PER_MINUTE / s.bpm)
        .collect()
}

/// Ectopic filter for RR interval series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RrFilter {
    /// Maximum allowed relative change between adjacent intervals
    pub ectopic_threshold: f64,
    /// Minimum surviving intervals for the window to be usable
    pub min_intervals: usize,
}

impl Default for RrFilter {
    fn default() -> Self {
        Self {
            ectopic_threshold: DEFAULT_ECTOPIC_THRESHOLD,
            min_intervals: DEFAULT_MIN_RR_INTERVALS,
        }
    }
}

impl RrFilter {
    pub fn new(ectopic_threshold: f64, min_intervals: usize) -> Self {
        Self {
            ectopic_threshold,
            min_intervals,
        }
    }

    /// Per-index validity after comparing every adjacent pair.
    ///
    /// A pair whose relative change exceeds the threshold invalidates both members.
    pub fn validity_mask(&self, rr: &[f64]) -> Vec<bool> {
        let mut valid = vec![true; rr.len()];

        for i in 1..rr.len() {
            let prev = rr[i - 1];
            let change = (rr[i] - prev).abs() / prev;
            if change > self.ectopic_threshold {
                valid[i - 1] = false;
                valid[i] = false;
            }
        }

        valid
    }

    /// Surviving intervals in their original order.
    pub fn filter(&self, rr: &[f64]) -> Vec<f64> {
        let mask = self.validity_mask(rr);
        rr.iter()
            .zip(mask)
            .filter_map(|(&value, keep)| keep.then_some(value))
            .collect()
    }

    /// Convert and filter a sample window.
    ///
    /// Returns `None` when fewer than `min_intervals` valid intervals remain;
    /// this is ordinary data insufficiency, not a fault.
    pub fn clean(&self, samples: &[HeartRateSample]) -> Option<Vec<f64>> {
        let rr = to_rr_intervals(samples);
        let valid = self.filter(&rr);

        tracing::debug!(
            samples = samples.len(),
            intervals = rr.len(),
            valid = valid.len(),
            "ectopic filter applied"
        );

        (valid.len() >= self.min_intervals).then_some(valid)
    }
}
