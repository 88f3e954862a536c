//! Stress scoring
//!
//! Combines PRSA/HRV window features with the personal baseline (when one
//! exists) into a 0-100 score and categorical level.
//!
//! - Personalized: score moves against the percent change of DC and SDNN from
//!   the calm-period baseline
//! - Population fallback: banded adjustments for DC, SDNN and mean heart rate

use crate::baseline::Baseline;
use crate::features::WindowFeatures;
use crate::types::{StressLevel, StressMetrics};

/// Score every evaluation starts from
pub const BASE_SCORE: i32 = 50;

/// Weight applied to DC percent change in the personalized branch
const DC_WEIGHT: f64 = -0.8;

/// Weight applied to SDNN percent change in the personalized branch
const SDNN_WEIGHT: f64 = -0.5;

/// Outcome of scoring one window
#[derive(Debug, Clone, PartialEq)]
pub struct StressAssessment {
    pub metrics: StressMetrics,
    pub is_stressed: bool,
}

/// Stress scorer
pub struct StressScorer;

impl StressScorer {
    /// Score a window against an optional baseline and a sleep-adjusted threshold
    pub fn score(
        features: &WindowFeatures,
        baseline: Option<&Baseline>,
        threshold: i32,
    ) -> StressAssessment {
        let Some(dc) = features.dc else {
            tracing::debug!(
                valid_intervals = features.valid_intervals,
                "DC unavailable, returning degraded result"
            );
            return StressAssessment {
                metrics: metrics_for(features, BASE_SCORE, StressLevel::InsufficientData),
                is_stressed: false,
            };
        };

        let adjustment = match baseline.filter(|b| b.dc != 0.0) {
            Some(baseline) => {
                tracing::debug!(dc, baseline_dc = baseline.dc, "personalized scoring");
                personalized_adjustment(dc, features.sdnn, baseline)
            }
            None => {
                tracing::debug!(dc, "population fallback scoring");
                population_adjustment(dc, features.sdnn, features.mean_hr)
            }
        };

        let score = clamp_score(BASE_SCORE as f64 + adjustment);

        StressAssessment {
            metrics: metrics_for(features, score, StressLevel::from_score(score)),
            is_stressed: score > threshold,
        }
    }
}

fn metrics_for(features: &WindowFeatures, score: i32, level: StressLevel) -> StressMetrics {
    StressMetrics {
        dc: features.dc,
        ac: features.ac,
        sdnn: features.sdnn,
        rmssd: features.rmssd,
        mean_hr: features.mean_hr,
        score,
        level,
    }
}

/// Clamp to 0-100 before converting; opposing infinite terms score neutral
fn clamp_score(raw: f64) -> i32 {
    if raw.is_nan() {
        return BASE_SCORE;
    }
    raw.clamp(0.0, 100.0) as i32
}

/// Percent change of `value` from `base`; `None` for a zero base
fn percent_change(value: f64, base: f64) -> Option<f64> {
    (base != 0.0).then(|| 100.0 * (value - base) / base)
}

fn personalized_adjustment(dc: f64, sdnn: Option<f64>, baseline: &Baseline) -> f64 {
    let mut adjustment = 0.0;

    if let Some(change) = percent_change(dc, baseline.dc) {
        adjustment += (DC_WEIGHT * change).round();
    }

    if let Some(change) = sdnn.and_then(|s| percent_change(s, baseline.sdnn)) {
        adjustment += (SDNN_WEIGHT * change).round();
    }

    adjustment
}

fn population_adjustment(dc: f64, sdnn: Option<f64>, mean_hr: Option<f64>) -> f64 {
    let mut adjustment = match dc {
        d if d < 2.0 => 25.0,
        d if d < 5.0 => 10.0,
        d if d > 10.0 => -15.0,
        _ => 0.0,
    };

    adjustment += match sdnn {
        Some(s) if s < 20.0 => 20.0,
        Some(s) if s < 35.0 => 10.0,
        Some(s) if s > 60.0 => -10.0,
        _ => 0.0,
    };

    adjustment += match mean_hr {
        Some(hr) if hr > 90.0 => 10.0,
        Some(hr) if hr < 65.0 => -10.0,
        _ => 0.0,
    };

    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn features(dc: Option<f64>, sdnn: Option<f64>, mean_hr: Option<f64>) -> WindowFeatures {
        WindowFeatures {
            dc,
            ac: dc.map(|d| -d),
            sdnn,
            rmssd: sdnn,
            mean_hr,
            valid_intervals: if dc.is_some() { 60 } else { 3 },
        }
    }

    fn baseline(dc: f64, sdnn: f64) -> Baseline {
        Baseline {
            dc,
            sdnn,
            readings: 5,
        }
    }

    #[test]
    fn test_population_fallback_stressed() {
        let assessment = StressScorer::score(&features(Some(3.0), Some(15.0), Some(95.0)), None, 60);

        assert_eq!(assessment.metrics.score, 90);
        assert_eq!(assessment.metrics.level, StressLevel::VeryHigh);
        assert!(assessment.is_stressed);
    }

    #[test]
    fn test_population_fallback_relaxed() {
        // -15 for DC, -10 for SDNN, -10 for HR
        let assessment = StressScorer::score(&features(Some(12.0), Some(70.0), Some(58.0)), None, 60);

        assert_eq!(assessment.metrics.score, 15);
        assert_eq!(assessment.metrics.level, StressLevel::Low);
        assert!(!assessment.is_stressed);
    }

    #[test]
    fn test_population_neutral_bands() {
        let assessment = StressScorer::score(&features(Some(7.0), Some(45.0), Some(75.0)), None, 60);
        assert_eq!(assessment.metrics.score, 50);
        assert_eq!(assessment.metrics.level, StressLevel::High);
    }

    #[test]
    fn test_personalized_dc_drop() {
        let base = baseline(4.0, 40.0);
        let assessment =
            StressScorer::score(&features(Some(3.0), Some(40.0), Some(95.0)), Some(&base), 60);

        // -0.8 * -25% = +20, SDNN unchanged, HR ignored
        assert_eq!(assessment.metrics.score, 70);
        assert_eq!(assessment.metrics.level, StressLevel::VeryHigh);
        assert!(assessment.is_stressed);
    }

    #[test]
    fn test_personalized_sdnn_term() {
        let base = baseline(4.0, 40.0);
        let assessment =
            StressScorer::score(&features(Some(4.0), Some(50.0), None), Some(&base), 60);

        // -0.5 * 25% = -12.5, rounded away from zero
        assert_eq!(assessment.metrics.score, 37);
        assert_eq!(assessment.metrics.level, StressLevel::Moderate);
    }

    #[test]
    fn test_zero_baseline_dc_falls_back() {
        let base = baseline(0.0, 40.0);
        let assessment = StressScorer::score(&features(Some(3.0), Some(15.0), Some(95.0)), Some(&base), 60);
        assert_eq!(assessment.metrics.score, 90);
    }

    #[test]
    fn test_score_clamped() {
        let base = baseline(10.0, 80.0);
        let low = StressScorer::score(&features(Some(1.0), Some(10.0), None), Some(&base), 60);
        assert_eq!(low.metrics.score, 100);

        let high = StressScorer::score(&features(Some(40.0), Some(300.0), None), Some(&base), 60);
        assert_eq!(high.metrics.score, 0);
        assert_eq!(high.metrics.level, StressLevel::Low);
    }

    #[test]
    fn test_near_zero_baseline_stays_in_range() {
        // DC far above a vanishing negative baseline drives the score down
        let negative = baseline(-1e-12, 40.0);
        let assessment =
            StressScorer::score(&features(Some(5.0), Some(40.0), None), Some(&negative), 60);
        assert_eq!(assessment.metrics.score, 100);
        assert!(assessment.is_stressed);

        let tiny = baseline(1e-12, 1e-12);
        let assessment = StressScorer::score(&features(Some(5.0), Some(40.0), None), Some(&tiny), 60);
        assert_eq!(assessment.metrics.score, 0);
        assert_eq!(assessment.metrics.level, StressLevel::Low);
        assert!(!assessment.is_stressed);
    }

    #[test]
    fn test_opposing_infinite_terms_score_neutral() {
        let subnormal = baseline(f64::MIN_POSITIVE / 4.0, -f64::MIN_POSITIVE / 4.0);
        let assessment =
            StressScorer::score(&features(Some(1e300), Some(1e300), None), Some(&subnormal), 60);
        assert_eq!(assessment.metrics.score, 50);
    }

    #[test]
    fn test_insufficient_data() {
        let assessment = StressScorer::score(&features(None, Some(30.0), Some(80.0)), None, 48);

        assert_eq!(assessment.metrics.score, 50);
        assert_eq!(assessment.metrics.level, StressLevel::InsufficientData);
        assert!(!assessment.is_stressed);
    }

    #[test]
    fn test_threshold_is_strict() {
        let assessment = StressScorer::score(&features(Some(7.0), Some(45.0), Some(75.0)), None, 50);
        assert_eq!(assessment.metrics.score, 50);
        assert!(!assessment.is_stressed);
    }
}
