//! Sleep-adjusted stress threshold
//!
//! Short sleep lowers the threshold at which a score counts as stressed; long
//! sleep raises it.

use crate::types::{SleepAdjustment, SleepQuality};

/// Default unadjusted stress threshold
pub const DEFAULT_STRESS_THRESHOLD: i32 = 60;

/// Default personal sleep baseline (hours)
pub const DEFAULT_SLEEP_BASELINE_HOURS: f64 = 7.0;

/// Maps last night's sleep to a stress threshold and quality label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepAdjuster {
    base_threshold: i32,
}

impl Default for SleepAdjuster {
    fn default() -> Self {
        Self::new(DEFAULT_STRESS_THRESHOLD)
    }
}

impl SleepAdjuster {
    pub fn new(base_threshold: i32) -> Self {
        Self { base_threshold }
    }

    /// Adjust the threshold for `sleep_hours` relative to `baseline_hours`.
    ///
    /// Missing or non-positive inputs leave the threshold unchanged with
    /// `SleepQuality::Unknown`.
    pub fn adjust(&self, sleep_hours: Option<f64>, baseline_hours: f64) -> SleepAdjustment {
        let sleep = match sleep_hours {
            Some(hours) if hours > 0.0 && baseline_hours > 0.0 => hours,
            _ => {
                return SleepAdjustment {
                    adjusted_threshold: self.base_threshold,
                    quality: SleepQuality::Unknown,
                }
            }
        };

        let ratio = sleep / baseline_hours;
        let (factor, quality) = match ratio {
            r if r < 0.75 => (0.80, SleepQuality::VeryPoor),
            r if r < 0.90 => (0.85, SleepQuality::Poor),
            r if r <= 1.10 => (1.0, SleepQuality::Normal),
            r if r <= 1.20 => (1.05, SleepQuality::Good),
            _ => (1.08, SleepQuality::Excellent),
        };

        tracing::debug!(sleep, baseline_hours, ratio, ?quality, "sleep adjustment");

        SleepAdjustment {
            adjusted_threshold: (self.base_threshold as f64 * factor).round() as i32,
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjust(sleep: Option<f64>, baseline: f64) -> (i32, SleepQuality) {
        let adjustment = SleepAdjuster::default().adjust(sleep, baseline);
        (adjustment.adjusted_threshold, adjustment.quality)
    }

    #[test]
    fn test_missing_sleep() {
        assert_eq!(adjust(None, 7.0), (60, SleepQuality::Unknown));
        assert_eq!(adjust(Some(0.0), 7.0), (60, SleepQuality::Unknown));
        assert_eq!(adjust(Some(7.0), 0.0), (60, SleepQuality::Unknown));
    }

    #[test]
    fn test_normal_sleep() {
        assert_eq!(adjust(Some(7.0), 7.0), (60, SleepQuality::Normal));
    }

    #[test]
    fn test_quality_bands() {
        // 5 / 7 = 0.714
        assert_eq!(adjust(Some(5.0), 7.0), (48, SleepQuality::VeryPoor));
        assert_eq!(adjust(Some(6.0), 7.5), (51, SleepQuality::Poor));
        assert_eq!(adjust(Some(8.0), 7.0), (63, SleepQuality::Good));
        assert_eq!(adjust(Some(9.0), 7.0), (65, SleepQuality::Excellent));
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(adjust(Some(3.0), 4.0), (51, SleepQuality::Poor));
        assert_eq!(adjust(Some(9.0), 10.0), (60, SleepQuality::Normal));
        assert_eq!(adjust(Some(11.0), 10.0), (60, SleepQuality::Normal));
        assert_eq!(adjust(Some(12.0), 10.0), (63, SleepQuality::Good));
    }
}
