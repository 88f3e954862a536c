//! Core types for the Synheart Stress pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw samples, per-window stress metrics, sleep adjustment and the
//! final pipeline result handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single heart-rate reading from the health data store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Instantaneous heart rate (beats per minute); non-positive values are malformed
    pub bpm: f64,
}

impl HeartRateSample {
    pub fn new(timestamp: DateTime<Utc>, bpm: f64) -> Self {
        Self { timestamp, bpm }
    }
}

/// A single movement magnitude reading (accelerometer or step cadence derived)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSample {
    pub timestamp: DateTime<Utc>,
    pub magnitude: f64,
}

/// Categorical stress level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    /// Fewer than the minimum number of valid RR intervals in the window
    InsufficientData,
    /// Scoring skipped because the user is physically active
    PhysicalActivity,
    /// Scoring skipped because the activity classifier could not decide
    InsufficientClassification,
}

impl StressLevel {
    /// Map a clamped score onto the graded levels.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s < 30 => StressLevel::Low,
            s if s < 50 => StressLevel::Moderate,
            s if s < 70 => StressLevel::High,
            _ => StressLevel::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Moderate => "moderate",
            StressLevel::High => "high",
            StressLevel::VeryHigh => "very_high",
            StressLevel::InsufficientData => "insufficient_data",
            StressLevel::PhysicalActivity => "physical_activity",
            StressLevel::InsufficientClassification => "insufficient_classification",
        }
    }
}

/// Sleep quality label derived from last night's sleep relative to baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    VeryPoor,
    Poor,
    Normal,
    Good,
    Excellent,
    Unknown,
}

/// Activity type reported by the external classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Physical,
    Cognitive,
    Unknown,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Physical => "physical",
            ActivityType::Cognitive => "cognitive",
            ActivityType::Unknown => "unknown",
        }
    }
}

/// Output of the activity classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityClassification {
    pub activity_type: ActivityType,
    /// Classifier confidence (0-1)
    pub confidence: f64,
}

impl ActivityClassification {
    pub fn new(activity_type: ActivityType, confidence: f64) -> Self {
        Self {
            activity_type,
            confidence,
        }
    }

    /// Classification used when the classifier fails or cannot decide
    pub fn unknown() -> Self {
        Self::new(ActivityType::Unknown, 0.0)
    }
}

/// Stress metrics produced once per evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressMetrics {
    /// Deceleration capacity (ms)
    pub dc: Option<f64>,
    /// Acceleration capacity (ms)
    pub ac: Option<f64>,
    /// Standard deviation of valid RR intervals (ms)
    pub sdnn: Option<f64>,
    /// Root mean square of successive differences (ms)
    pub rmssd: Option<f64>,
    /// Mean heart rate over the valid intervals (bpm)
    pub mean_hr: Option<f64>,
    /// Stress score, always within 0-100
    pub score: i32,
    pub level: StressLevel,
}

impl StressMetrics {
    /// Metrics for a run where scoring was skipped entirely
    pub fn skipped(level: StressLevel) -> Self {
        Self {
            dc: None,
            ac: None,
            sdnn: None,
            rmssd: None,
            mean_hr: None,
            score: 0,
            level,
        }
    }
}

/// Stress threshold adjusted for last night's sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepAdjustment {
    pub adjusted_threshold: i32,
    pub quality: SleepQuality,
}

/// Orchestrator lifecycle for a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
}

/// Immutable snapshot returned by every pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub timestamp: DateTime<Utc>,
    pub activity_type: ActivityType,
    /// Classifier confidence (0-1)
    pub activity_confidence: f64,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: SleepQuality,
    pub adjusted_threshold: i32,
    #[serde(flatten)]
    pub metrics: StressMetrics,
    pub is_stressed: bool,
    /// Reserved; always absent in this version
    pub recovery_slope: Option<f64>,
}
