//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Stress.
//! It sequences sample acquisition, activity classification, sleep adjustment
//! and stress scoring into one `PipelineResult`, and feeds the baseline
//! calibrator on explicit calibration requests.

use crate::baseline::{lock_baseline, BaselineReading, SharedBaseline};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::features::{ActivityFeatures, WindowFeatures};
use crate::scorer::StressScorer;
use crate::source::{ActivityClassifier, SampleSource};
use crate::types::{
    ActivityClassification, ActivityType, HeartRateSample, MovementSample, PipelineResult,
    PipelineState, StressLevel, StressMetrics,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Samples gathered at the single acquisition point of a run
struct SampleWindow {
    heart_rate: Vec<HeartRateSample>,
    movement: Vec<MovementSample>,
    sleep_hours: Option<f64>,
}

/// Stress detection pipeline.
///
/// Pipeline stages for `run`:
/// 1. SampleSource - fetch heart rate, movement and sleep (the only await)
/// 2. ActivityFeatures - assemble classifier inputs
/// 3. ActivityClassifier - physical, cognitive or unknown
/// 4. SleepAdjuster - sleep-adjusted stress threshold
/// 5. WindowFeatures + StressScorer - only for cognitive activity
///
/// The baseline calibrator is injected and shared; it is only mutated by
/// `calibrate`.
pub struct StressPipeline<S, C> {
    source: S,
    classifier: C,
    baseline: SharedBaseline,
    config: PipelineConfig,
    state: watch::Sender<PipelineState>,
}

impl<S, C> StressPipeline<S, C>
where
    S: SampleSource,
    C: ActivityClassifier,
{
    /// Create a pipeline with default configuration
    pub fn new(source: S, classifier: C, baseline: SharedBaseline) -> Self {
        Self::with_config(source, classifier, baseline, PipelineConfig::default())
    }

    /// Create a pipeline with a specific configuration
    pub fn with_config(
        source: S,
        classifier: C,
        baseline: SharedBaseline,
        config: PipelineConfig,
    ) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            source,
            classifier,
            baseline,
            config,
            state,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle to the shared baseline calibrator
    pub fn baseline(&self) -> SharedBaseline {
        self.baseline.clone()
    }

    /// State of the most recent run
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Observe run state transitions
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Evaluate stress over the window ending now
    pub async fn run(&self) -> Result<PipelineResult, PipelineError> {
        self.run_at(Utc::now()).await
    }

    /// Evaluate stress over the window ending at `now`.
    ///
    /// Acquisition failures propagate; every other condition degrades to a
    /// well-defined result.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<PipelineResult, PipelineError> {
        let run = RunGuard::start(&self.state);

        let window = self.acquire(now, self.config.sample_window()).await?;

        let activity_features = ActivityFeatures::assemble(&window.heart_rate, &window.movement);
        let classification = self.classify(&activity_features);

        let sleep = self
            .config
            .sleep_adjuster()
            .adjust(window.sleep_hours, self.config.sleep_baseline_hours);

        let (metrics, is_stressed) = match classification.activity_type {
            ActivityType::Physical => (StressMetrics::skipped(StressLevel::PhysicalActivity), false),
            ActivityType::Unknown => (
                StressMetrics::skipped(StressLevel::InsufficientClassification),
                false,
            ),
            ActivityType::Cognitive => {
                let features = WindowFeatures::derive(&window.heart_rate, &self.config.rr_filter());
                let baseline = lock_baseline(&self.baseline).baseline();
                let assessment =
                    StressScorer::score(&features, baseline.as_ref(), sleep.adjusted_threshold);
                (assessment.metrics, assessment.is_stressed)
            }
        };

        let result = PipelineResult {
            timestamp: now,
            activity_type: classification.activity_type,
            activity_confidence: classification.confidence,
            sleep_hours: window.sleep_hours,
            sleep_quality: sleep.quality,
            adjusted_threshold: sleep.adjusted_threshold,
            metrics,
            is_stressed,
            recovery_slope: None,
        };

        tracing::info!(
            activity = classification.activity_type.as_str(),
            score = result.metrics.score,
            level = result.metrics.level.as_str(),
            threshold = result.adjusted_threshold,
            is_stressed = result.is_stressed,
            "stress run completed"
        );

        run.complete();
        Ok(result)
    }

    /// Record a calm-period reading from the calibration window ending now
    pub async fn calibrate(&self) -> Result<Option<BaselineReading>, PipelineError> {
        self.calibrate_at(Utc::now()).await
    }

    /// Record a calm-period reading from the calibration window ending at `now`.
    ///
    /// Bypasses activity classification. Returns `None` when the window could
    /// not produce both DC and SDNN. The baseline is untouched on error or
    /// cancellation.
    pub async fn calibrate_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<BaselineReading>, PipelineError> {
        let start = window_start(now, self.config.calibration_window())?;
        let samples = self
            .with_timeout(self.source.fetch_heart_rate_samples(start, now))
            .await?;

        let reading = lock_baseline(&self.baseline).add_reading(&samples);
        Ok(reading)
    }

    async fn acquire(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<SampleWindow, PipelineError> {
        let start = window_start(now, window)?;

        let fetch = async {
            tokio::try_join!(
                self.source.fetch_heart_rate_samples(start, now),
                self.source.fetch_movement_samples(start, now),
                self.source.fetch_sleep_hours(),
            )
        };
        let (heart_rate, movement, sleep_hours) = self.with_timeout(fetch).await?;

        tracing::debug!(
            heart_rate = heart_rate.len(),
            movement = movement.len(),
            ?sleep_hours,
            "samples acquired"
        );

        Ok(SampleWindow {
            heart_rate,
            movement,
            sleep_hours,
        })
    }

    async fn with_timeout<T>(
        &self,
        fetch: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        match self.config.acquisition_timeout() {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| PipelineError::AcquisitionTimeout(limit))?,
            None => fetch.await,
        }
    }

    /// Classifier failures and zero-confidence answers become `Unknown`
    fn classify(&self, features: &ActivityFeatures) -> ActivityClassification {
        match self.classifier.classify(features) {
            Ok(c) if c.confidence.is_finite() && c.confidence > 0.0 => {
                ActivityClassification::new(c.activity_type, c.confidence.min(1.0))
            }
            Ok(_) => ActivityClassification::unknown(),
            Err(e) => {
                tracing::warn!(error = %e, "activity classifier failed");
                ActivityClassification::unknown()
            }
        }
    }
}

fn window_start(now: DateTime<Utc>, window: Duration) -> Result<DateTime<Utc>, PipelineError> {
    let span = chrono::Duration::from_std(window)
        .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
    now.checked_sub_signed(span).ok_or_else(|| {
        PipelineError::InvalidConfig(format!(
            "window of {}s reaches before the earliest representable time",
            window.as_secs()
        ))
    })
}

/// Publishes `Running` on start and falls back to `Idle` unless completed
struct RunGuard<'a> {
    state: &'a watch::Sender<PipelineState>,
    completed: bool,
}

impl<'a> RunGuard<'a> {
    fn start(state: &'a watch::Sender<PipelineState>) -> Self {
        state.send_replace(PipelineState::Running);
        Self {
            state,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
        self.state.send_replace(PipelineState::Completed);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.state.send_replace(PipelineState::Idle);
        }
    }
}
