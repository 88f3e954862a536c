//! External collaborators
//!
//! The pipeline reads samples from a health data store and asks an opaque
//! activity classifier whether the user is moving. Both are abstracted here so
//! platforms can plug in their own implementations.

use crate::error::PipelineError;
use crate::features::ActivityFeatures;
use crate::types::{ActivityClassification, ActivityType, HeartRateSample, MovementSample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of heart-rate, movement and sleep data
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Heart-rate samples in `[start, end]`, in acquisition order
    async fn fetch_heart_rate_samples(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HeartRateSample>, PipelineError>;

    /// Last night's sleep duration in hours, if known
    async fn fetch_sleep_hours(&self) -> Result<Option<f64>, PipelineError>;

    /// Movement magnitudes in `[start, end]`; sources without motion data
    /// return none
    async fn fetch_movement_samples(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<MovementSample>, PipelineError> {
        Ok(Vec::new())
    }
}

/// Opaque physical/cognitive activity classifier
pub trait ActivityClassifier: Send + Sync {
    fn classify(&self, features: &ActivityFeatures) -> Result<ActivityClassification, PipelineError>;
}

/// Classifier that always reports the same classification
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier {
    classification: ActivityClassification,
}

impl FixedClassifier {
    pub fn new(activity_type: ActivityType, confidence: f64) -> Self {
        Self {
            classification: ActivityClassification::new(activity_type, confidence),
        }
    }
}

impl ActivityClassifier for FixedClassifier {
    fn classify(&self, _features: &ActivityFeatures) -> Result<ActivityClassification, PipelineError> {
        Ok(self.classification)
    }
}

/// In-memory sample source, also the on-disk window file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySampleSource {
    pub heart_rate: Vec<HeartRateSample>,
    #[serde(default)]
    pub movement: Vec<MovementSample>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
}

impl MemorySampleSource {
    pub fn new(heart_rate: Vec<HeartRateSample>) -> Self {
        Self {
            heart_rate,
            ..Default::default()
        }
    }

    pub fn with_sleep_hours(mut self, hours: f64) -> Self {
        self.sleep_hours = Some(hours);
        self
    }

    pub fn with_movement(mut self, movement: Vec<MovementSample>) -> Self {
        self.movement = movement;
        self
    }

    /// Parse a window file
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Timestamp of the most recent heart-rate sample
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.heart_rate.iter().map(|s| s.timestamp).max()
    }
}

#[async_trait]
impl SampleSource for MemorySampleSource {
    async fn fetch_heart_rate_samples(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HeartRateSample>, PipelineError> {
        Ok(self
            .heart_rate
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .copied()
            .collect())
    }

    async fn fetch_sleep_hours(&self) -> Result<Option<f64>, PipelineError> {
        Ok(self.sleep_hours)
    }

    async fn fetch_movement_samples(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MovementSample>, PipelineError> {
        Ok(self
            .movement
            .iter()
            .filter(|m| m.timestamp >= start && m.timestamp <= end)
            .copied()
            .collect())
    }
}
