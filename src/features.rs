//! Feature derivation
//!
//! This module derives per-window features from raw samples:
//! - PRSA deceleration/acceleration capacity and HRV statistics for scoring
//! - Heart-rate and movement summary statistics for the activity classifier

use crate::hrv;
use crate::prsa::prsa_capacity;
use crate::rr::RrFilter;
use crate::types::{HeartRateSample, MovementSample};
use serde::{Deserialize, Serialize};

/// Stress-relevant features of one heart-rate window.
///
/// All fields are absent when the window holds fewer valid RR intervals than
/// the filter requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowFeatures {
    pub dc: Option<f64>,
    pub ac: Option<f64>,
    pub sdnn: Option<f64>,
    pub rmssd: Option<f64>,
    pub mean_hr: Option<f64>,
    /// Number of RR intervals surviving the ectopic filter
    pub valid_intervals: usize,
}

impl WindowFeatures {
    /// Run RR conversion, ectopic filtering, PRSA and HRV over a sample window
    pub fn derive(samples: &[HeartRateSample], filter: &RrFilter) -> Self {
        let Some(rr) = filter.clean(samples) else {
            return Self::default();
        };

        let capacity = prsa_capacity(&rr);

        Self {
            dc: capacity.dc,
            ac: capacity.ac,
            sdnn: hrv::sdnn(&rr),
            rmssd: hrv::rmssd(&rr),
            mean_hr: hrv::mean_heart_rate(&rr),
            valid_intervals: rr.len(),
        }
    }
}

/// Feature vector handed to the activity classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeatures {
    pub hr_mean: f64,
    pub hr_std: f64,
    pub movement_mean: f64,
    pub movement_std: f64,
}

impl ActivityFeatures {
    /// Assemble classifier features from the raw window.
    ///
    /// Malformed (non-positive) bpm readings are ignored; empty inputs yield 0.0.
    pub fn assemble(heart_rate: &[HeartRateSample], movement: &[MovementSample]) -> Self {
        let bpm: Vec<f64> = heart_rate
            .iter()
            .map(|s| s.bpm)
            .filter(|&bpm| bpm > 0.0 && bpm.is_finite())
            .collect();
        let magnitudes: Vec<f64> = movement.iter().map(|m| m.magnitude).collect();

        let (hr_mean, hr_std) = mean_and_std(&bpm);
        let (movement_mean, movement_std) = mean_and_std(&magnitudes);

        Self {
            hr_mean,
            hr_std,
            movement_mean,
            movement_std,
        }
    }
}

/// Mean and population standard deviation
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn samples_from_rr(rr: &[f64]) -> Vec<HeartRateSample> {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        rr.iter()
            .enumerate()
            .map(|(i, &v)| HeartRateSample::new(start + Duration::seconds(i as i64), 60_000.0 / v))
            .collect()
    }

    #[test]
    fn test_constant_window() {
        let features = WindowFeatures::derive(&samples_from_rr(&[1000.0; 6]), &RrFilter::default());

        assert!(features.dc.is_none());
        assert!(features.ac.is_none());
        assert_eq!(features.sdnn, Some(0.0));
        assert_eq!(features.rmssd, Some(0.0));
        assert!((features.mean_hr.unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(features.valid_intervals, 6);
    }

    #[test]
    fn test_insufficient_window_is_empty() {
        // four valid samples plus a malformed one
        let mut samples = samples_from_rr(&[1000.0; 4]);
        samples.push(HeartRateSample::new(Utc::now(), 0.0));

        let features = WindowFeatures::derive(&samples, &RrFilter::default());
        assert_eq!(features, WindowFeatures::default());
    }

    #[test]
    fn test_prsa_and_hrv_populated() {
        let rr = [600.0, 606.0, 612.0, 606.0, 600.0, 606.0];
        let features = WindowFeatures::derive(&samples_from_rr(&rr), &RrFilter::default());

        assert!((features.dc.unwrap() - 3.0).abs() < 1e-6);
        assert!((features.ac.unwrap() + 3.0).abs() < 1e-6);
        assert!(features.sdnn.unwrap() < 20.0);
        assert!(features.mean_hr.unwrap() > 90.0);
    }

    #[test]
    fn test_activity_features() {
        let now = Utc::now();
        let heart_rate = vec![
            HeartRateSample::new(now, 60.0),
            HeartRateSample::new(now, 80.0),
            HeartRateSample::new(now, -1.0),
        ];
        let movement = vec![
            MovementSample { timestamp: now, magnitude: 1.0 },
            MovementSample { timestamp: now, magnitude: 3.0 },
        ];

        let features = ActivityFeatures::assemble(&heart_rate, &movement);
        assert_eq!(features.hr_mean, 70.0);
        assert_eq!(features.hr_std, 10.0);
        assert_eq!(features.movement_mean, 2.0);
        assert_eq!(features.movement_std, 1.0);

        let empty = ActivityFeatures::assemble(&[], &[]);
        assert_eq!(empty, ActivityFeatures::default());
    }
}
