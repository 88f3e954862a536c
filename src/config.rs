//! Configuration for the stress pipeline.

use crate::baseline::{BaselineCalibrator, DEFAULT_BASELINE_CAPACITY, DEFAULT_MIN_BASELINE_READINGS};
use crate::error::PipelineError;
use crate::rr::{RrFilter, DEFAULT_ECTOPIC_THRESHOLD, DEFAULT_MIN_RR_INTERVALS};
use crate::sleep::{SleepAdjuster, DEFAULT_SLEEP_BASELINE_HOURS, DEFAULT_STRESS_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest accepted look-back window (7 days)
pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Tunable parameters of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Relative change between adjacent RR intervals treated as ectopic
    pub ectopic_threshold: f64,

    /// Minimum valid RR intervals for window metrics
    pub min_rr_intervals: usize,

    /// Maximum calibration readings kept
    pub baseline_capacity: usize,

    /// Calibration readings required before personalized scoring
    pub min_baseline_readings: usize,

    /// Stress threshold before sleep adjustment
    pub base_stress_threshold: i32,

    /// Personal sleep baseline (hours)
    pub sleep_baseline_hours: f64,

    /// Look-back window for stress runs (seconds)
    pub sample_window_secs: u64,

    /// Look-back window for calibration (seconds)
    pub calibration_window_secs: u64,

    /// Optional timeout around sample acquisition (seconds)
    pub acquisition_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ectopic_threshold: DEFAULT_ECTOPIC_THRESHOLD,
            min_rr_intervals: DEFAULT_MIN_RR_INTERVALS,
            baseline_capacity: DEFAULT_BASELINE_CAPACITY,
            min_baseline_readings: DEFAULT_MIN_BASELINE_READINGS,
            base_stress_threshold: DEFAULT_STRESS_THRESHOLD,
            sleep_baseline_hours: DEFAULT_SLEEP_BASELINE_HOURS,
            sample_window_secs: 300, // 5 minutes
            calibration_window_secs: 120,
            acquisition_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| -> Result<(), PipelineError> {
            Err(PipelineError::InvalidConfig(msg))
        };

        if !self.ectopic_threshold.is_finite() || self.ectopic_threshold <= 0.0 {
            return invalid(format!(
                "ectopic_threshold must be positive, got {}",
                self.ectopic_threshold
            ));
        }
        if self.min_rr_intervals < DEFAULT_MIN_RR_INTERVALS {
            return invalid(format!(
                "min_rr_intervals must be at least {}, got {}",
                DEFAULT_MIN_RR_INTERVALS, self.min_rr_intervals
            ));
        }
        if self.baseline_capacity == 0 {
            return invalid("baseline_capacity must be non-zero".to_string());
        }
        if self.min_baseline_readings == 0 || self.min_baseline_readings > self.baseline_capacity {
            return invalid(format!(
                "min_baseline_readings must be within 1..={}, got {}",
                self.baseline_capacity, self.min_baseline_readings
            ));
        }
        if !self.sleep_baseline_hours.is_finite() || self.sleep_baseline_hours <= 0.0 {
            return invalid(format!(
                "sleep_baseline_hours must be positive, got {}",
                self.sleep_baseline_hours
            ));
        }
        for (name, secs) in [
            ("sample_window_secs", self.sample_window_secs),
            ("calibration_window_secs", self.calibration_window_secs),
        ] {
            if secs == 0 || secs > MAX_WINDOW_SECS {
                return invalid(format!("{name} must be within 1..={MAX_WINDOW_SECS}, got {secs}"));
            }
        }
        if self.acquisition_timeout_secs == Some(0) {
            return invalid("acquisition_timeout_secs must be non-zero when set".to_string());
        }

        Ok(())
    }

    pub fn rr_filter(&self) -> RrFilter {
        RrFilter::new(self.ectopic_threshold, self.min_rr_intervals)
    }

    pub fn sleep_adjuster(&self) -> SleepAdjuster {
        SleepAdjuster::new(self.base_stress_threshold)
    }

    /// A fresh, empty calibrator sized by this configuration
    pub fn baseline_calibrator(&self) -> BaselineCalibrator {
        BaselineCalibrator::with_filter(
            self.baseline_capacity,
            self.min_baseline_readings,
            self.rr_filter(),
        )
    }

    pub fn sample_window(&self) -> Duration {
        Duration::from_secs(self.sample_window_secs)
    }

    pub fn calibration_window(&self) -> Duration {
        Duration::from_secs(self.calibration_window_secs)
    }

    pub fn acquisition_timeout(&self) -> Option<Duration> {
        self.acquisition_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rr_filter(), RrFilter::default());
        assert_eq!(config.sample_window(), Duration::from_secs(300));
        assert!(config.acquisition_timeout().is_none());

        let calibrator = config.baseline_calibrator();
        assert_eq!(calibrator.capacity(), 50);
        assert!(calibrator.is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            PipelineConfig::from_json(r#"{"sleep_baseline_hours": 8.0, "acquisition_timeout_secs": 5}"#)
                .unwrap();

        assert_eq!(config.sleep_baseline_hours, 8.0);
        assert_eq!(config.acquisition_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.baseline_capacity, 50);
    }

    #[test]
    fn test_rejects_invalid() {
        for json in [
            r#"{"ectopic_threshold": 0.0}"#,
            r#"{"min_rr_intervals": 3}"#,
            r#"{"min_rr_intervals": 4}"#,
            r#"{"baseline_capacity": 0}"#,
            r#"{"min_baseline_readings": 51}"#,
            r#"{"sleep_baseline_hours": -1.0}"#,
            r#"{"sample_window_secs": 0}"#,
            r#"{"sample_window_secs": 10000000000000}"#,
            r#"{"calibration_window_secs": 604801}"#,
            r#"{"acquisition_timeout_secs": 0}"#,
        ] {
            assert!(
                matches!(PipelineConfig::from_json(json), Err(PipelineError::InvalidConfig(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_accepts_bounds() {
        let config = PipelineConfig::from_json(
            r#"{"min_rr_intervals": 5, "sample_window_secs": 604800, "calibration_window_secs": 1}"#,
        )
        .unwrap();
        assert_eq!(config.sample_window(), Duration::from_secs(MAX_WINDOW_SECS));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = PipelineConfig {
            base_stress_threshold: 55,
            ..Default::default()
        };
        let loaded = PipelineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, loaded);
    }
}
