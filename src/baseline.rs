//! Baseline calibration
//!
//! This module maintains a rolling window of personal DC/SDNN readings taken
//! during calm periods. Baselines enable personalized interpretation of stress
//! windows once enough readings have been collected.
//!
//! The window is a fixed-capacity ring buffer: once full, each new reading
//! overwrites the oldest one at the cursor.

use crate::error::PipelineError;
use crate::features::WindowFeatures;
use crate::rr::{RrFilter, DEFAULT_MIN_RR_INTERVALS};
use crate::types::HeartRateSample;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default number of calibration readings kept
pub const DEFAULT_BASELINE_CAPACITY: usize = 50;

/// Default number of readings before a baseline is usable
pub const DEFAULT_MIN_BASELINE_READINGS: usize = 5;

/// Calibrator shared between the orchestrator and calibration callers.
///
/// The lock is synchronous and never held across an await.
pub type SharedBaseline = Arc<Mutex<BaselineCalibrator>>;

/// Lock a shared calibrator.
///
/// Every mutation leaves the ring buffer consistent, so a guard poisoned by a
/// panicking holder is still safe to use.
pub fn lock_baseline(shared: &SharedBaseline) -> MutexGuard<'_, BaselineCalibrator> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One calibration reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineReading {
    /// Deceleration capacity (ms)
    pub dc: f64,
    /// SDNN (ms)
    pub sdnn: f64,
}

/// Snapshot of a usable personal baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Mean DC over stored readings
    pub dc: f64,
    /// Mean SDNN over stored readings
    pub sdnn: f64,
    /// Number of readings behind the means
    pub readings: usize,
}

/// Rolling baseline of calm-period DC/SDNN readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineCalibrator {
    /// Stored readings; ring-ordered once the buffer has wrapped
    readings: Vec<BaselineReading>,
    /// Next slot to overwrite once the buffer is full
    cursor: usize,
    /// Maximum number of readings
    capacity: usize,
    /// Readings required before the baseline is usable
    min_readings: usize,
    /// Filter applied to calibration windows
    filter: RrFilter,
}

impl Default for BaselineCalibrator {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_CAPACITY, DEFAULT_MIN_BASELINE_READINGS)
    }
}

impl BaselineCalibrator {
    /// Create a calibrator with the given capacity and usability threshold
    pub fn new(capacity: usize, min_readings: usize) -> Self {
        Self::with_filter(capacity, min_readings, RrFilter::default())
    }

    /// Create a calibrator with a custom ectopic filter
    pub fn with_filter(capacity: usize, min_readings: usize, filter: RrFilter) -> Self {
        Self {
            readings: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
            min_readings,
            filter,
        }
    }

    /// Wrap the calibrator for sharing with a pipeline
    pub fn into_shared(self) -> SharedBaseline {
        Arc::new(Mutex::new(self))
    }

    /// Derive DC/SDNN from a calm window and store them.
    ///
    /// Returns the stored reading, or `None` if the window lacked DC or SDNN.
    pub fn add_reading(&mut self, samples: &[HeartRateSample]) -> Option<BaselineReading> {
        let features = WindowFeatures::derive(samples, &self.filter);

        let (Some(dc), Some(sdnn)) = (features.dc, features.sdnn) else {
            tracing::warn!(
                samples = samples.len(),
                valid_intervals = features.valid_intervals,
                "calibration window rejected: DC or SDNN unavailable"
            );
            return None;
        };

        let reading = BaselineReading { dc, sdnn };
        self.push(reading);

        tracing::info!(dc, sdnn, stored = self.len(), "baseline reading added");
        Some(reading)
    }

    /// Store a reading, evicting the oldest once at capacity
    pub fn push(&mut self, reading: BaselineReading) {
        if self.capacity == 0 {
            return;
        }

        if self.readings.len() < self.capacity {
            self.readings.push(reading);
        } else {
            self.readings[self.cursor] = reading;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Mean stored DC, if the baseline is usable
    pub fn baseline_dc(&self) -> Option<f64> {
        self.has_baseline()
            .then(|| self.mean_of(|r| r.dc))
    }

    /// Mean stored SDNN, if the baseline is usable
    pub fn baseline_sdnn(&self) -> Option<f64> {
        self.has_baseline()
            .then(|| self.mean_of(|r| r.sdnn))
    }

    /// Whether enough readings exist for personalized scoring
    pub fn has_baseline(&self) -> bool {
        !self.readings.is_empty() && self.readings.len() >= self.min_readings
    }

    /// Snapshot of the current baseline, if usable
    pub fn baseline(&self) -> Option<Baseline> {
        Some(Baseline {
            dc: self.baseline_dc()?,
            sdnn: self.baseline_sdnn()?,
            readings: self.readings.len(),
        })
    }

    /// Stored readings, oldest first
    pub fn readings(&self) -> Vec<BaselineReading> {
        if self.readings.len() < self.capacity {
            return self.readings.clone();
        }
        let (newer, older) = self.readings.split_at(self.cursor);
        older.iter().chain(newer).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all baseline data
    pub fn clear(&mut self) {
        self.readings.clear();
        self.cursor = 0;
    }

    fn mean_of(&self, field: impl Fn(&BaselineReading) -> f64) -> f64 {
        let sum: f64 = self.readings.iter().map(field).sum();
        sum / self.readings.len() as f64
    }

    /// Load a calibrator from JSON, checking ring buffer consistency
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let calibrator: Self = serde_json::from_str(json)?;
        calibrator.check_consistency()?;
        Ok(calibrator)
    }

    fn check_consistency(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| -> Result<(), PipelineError> {
            Err(PipelineError::InvalidBaseline(msg))
        };
        let len = self.readings.len();

        if self.capacity == 0 {
            return invalid("capacity must be non-zero".to_string());
        }
        if len > self.capacity {
            return invalid(format!("{} readings exceed capacity {}", len, self.capacity));
        }
        // Until the buffer wraps, the next write appends
        if len < self.capacity && self.cursor != len {
            return invalid(format!(
                "cursor {} must equal reading count {} before the buffer is full",
                self.cursor, len
            ));
        }
        if self.cursor >= self.capacity {
            return invalid(format!(
                "cursor {} out of range for capacity {}",
                self.cursor, self.capacity
            ));
        }
        if self.min_readings == 0 || self.min_readings > self.capacity {
            return invalid(format!(
                "min_readings must be within 1..={}, got {}",
                self.capacity, self.min_readings
            ));
        }
        if self.filter.min_intervals < DEFAULT_MIN_RR_INTERVALS {
            return invalid(format!(
                "filter min_intervals must be at least {}, got {}",
                DEFAULT_MIN_RR_INTERVALS, self.filter.min_intervals
            ));
        }
        if !self.filter.ectopic_threshold.is_finite() || self.filter.ectopic_threshold <= 0.0 {
            return invalid(format!(
                "filter ectopic_threshold must be positive, got {}",
                self.filter.ectopic_threshold
            ));
        }

        Ok(())
    }

    /// Serialize the calibrator to JSON
    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn samples_from_rr(rr: &[f64]) -> Vec<HeartRateSample> {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap();
        rr.iter()
            .enumerate()
            .map(|(i, &v)| HeartRateSample::new(start + Duration::seconds(i as i64), 60_000.0 / v))
            .collect()
    }

    fn reading(dc: f64, sdnn: f64) -> BaselineReading {
        BaselineReading { dc, sdnn }
    }

    #[test]
    fn test_add_reading_from_calm_window() {
        let mut calibrator = BaselineCalibrator::default();
        let rr = [1000.0, 1010.0, 1020.0, 1010.0, 1000.0, 1010.0];

        let added = calibrator.add_reading(&samples_from_rr(&rr)).unwrap();
        assert!((added.dc - 5.0).abs() < 1e-6);
        assert!(added.sdnn > 0.0);
        assert_eq!(calibrator.len(), 1);
    }

    #[test]
    fn test_rejects_window_without_dc() {
        let mut calibrator = BaselineCalibrator::default();

        // constant series has SDNN but no DC
        assert!(calibrator.add_reading(&samples_from_rr(&[1000.0; 6])).is_none());
        // too short for anything
        assert!(calibrator.add_reading(&samples_from_rr(&[1000.0, 1010.0])).is_none());
        assert!(calibrator.is_empty());
    }

    #[test]
    fn test_baseline_requires_minimum_readings() {
        let mut calibrator = BaselineCalibrator::default();

        for _ in 0..4 {
            calibrator.push(reading(4.0, 40.0));
        }
        assert!(!calibrator.has_baseline());
        assert!(calibrator.baseline_dc().is_none());
        assert!(calibrator.baseline_sdnn().is_none());

        calibrator.push(reading(9.0, 65.0));
        assert!(calibrator.has_baseline());
        assert!((calibrator.baseline_dc().unwrap() - 5.0).abs() < 1e-9);
        assert!((calibrator.baseline_sdnn().unwrap() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut calibrator = BaselineCalibrator::new(3, 1);

        for dc in [1.0, 2.0, 3.0, 4.0, 5.0] {
            calibrator.push(reading(dc, 10.0));
        }

        assert_eq!(calibrator.len(), 3);
        assert_eq!(
            calibrator.readings(),
            vec![reading(3.0, 10.0), reading(4.0, 10.0), reading(5.0, 10.0)]
        );
        assert!((calibrator.baseline_dc().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_capacity() {
        let mut calibrator = BaselineCalibrator::default();
        for i in 0..60 {
            calibrator.push(reading(i as f64, 30.0));
        }

        assert_eq!(calibrator.len(), DEFAULT_BASELINE_CAPACITY);
        // readings 10..60 remain, mean 34.5
        assert!((calibrator.baseline_dc().unwrap() - 34.5).abs() < 1e-9);
        assert_eq!(calibrator.readings()[0], reading(10.0, 30.0));
    }

    #[test]
    fn test_clear() {
        let mut calibrator = BaselineCalibrator::new(3, 1);
        calibrator.push(reading(1.0, 1.0));
        calibrator.clear();

        assert!(calibrator.is_empty());
        assert!(calibrator.baseline().is_none());
    }

    #[test]
    fn test_serialization() {
        let mut calibrator = BaselineCalibrator::new(3, 2);
        for dc in [1.0, 2.0, 3.0, 4.0] {
            calibrator.push(reading(dc, 20.0));
        }

        let json = calibrator.to_json().unwrap();
        let loaded = BaselineCalibrator::from_json(&json).unwrap();

        assert_eq!(calibrator.readings(), loaded.readings());
        assert_eq!(calibrator.baseline(), loaded.baseline());
    }

    #[test]
    fn test_rejects_inconsistent_state() {
        let json = r#"{
            "readings": [{"dc": 1.0, "sdnn": 1.0}, {"dc": 2.0, "sdnn": 2.0}],
            "cursor": 0,
            "capacity": 1,
            "min_readings": 1,
            "filter": {"ectopic_threshold": 0.2, "min_intervals": 5}
        }"#;

        assert!(matches!(
            BaselineCalibrator::from_json(json),
            Err(PipelineError::InvalidBaseline(_))
        ));
        assert!(matches!(
            BaselineCalibrator::from_json("not json"),
            Err(PipelineError::JsonError(_))
        ));
    }

    fn stored(readings: &str, cursor: usize, capacity: usize, min_readings: usize) -> String {
        format!(
            r#"{{
                "readings": {readings},
                "cursor": {cursor},
                "capacity": {capacity},
                "min_readings": {min_readings},
                "filter": {{"ectopic_threshold": 0.2, "min_intervals": 5}}
            }}"#
        )
    }

    #[test]
    fn test_rejects_cursor_behind_partial_buffer() {
        let two = r#"[{"dc": 1.0, "sdnn": 1.0}, {"dc": 2.0, "sdnn": 2.0}]"#;

        assert!(matches!(
            BaselineCalibrator::from_json(&stored(two, 0, 3, 1)),
            Err(PipelineError::InvalidBaseline(_))
        ));

        // the matching cursor keeps eviction oldest-first
        let mut loaded = BaselineCalibrator::from_json(&stored(two, 2, 3, 1)).unwrap();
        loaded.push(reading(3.0, 3.0));
        loaded.push(reading(4.0, 4.0));
        assert_eq!(
            loaded.readings(),
            vec![reading(2.0, 2.0), reading(3.0, 3.0), reading(4.0, 4.0)]
        );
    }

    #[test]
    fn test_rejects_stored_parameters_out_of_range() {
        let one = r#"[{"dc": 1.0, "sdnn": 1.0}]"#;

        for json in [
            stored(one, 1, 3, 0),
            stored(one, 1, 3, 4),
            stored("[]", 0, 0, 1),
            stored(one, 1, 3, 1).replace(r#""min_intervals": 5"#, r#""min_intervals": 4"#),
        ] {
            assert!(
                matches!(
                    BaselineCalibrator::from_json(&json),
                    Err(PipelineError::InvalidBaseline(_))
                ),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_poisoned_lock_still_usable() {
        let shared = BaselineCalibrator::new(3, 1).into_shared();

        let handle = shared.clone();
        let _ = std::thread::spawn(move || {
            let mut guard = lock_baseline(&handle);
            guard.push(BaselineReading { dc: 4.0, sdnn: 40.0 });
            panic!("holder panicked");
        })
        .join();

        assert!(shared.is_poisoned());
        assert_eq!(lock_baseline(&shared).baseline_dc(), Some(4.0));
    }
}
