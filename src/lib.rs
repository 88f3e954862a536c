//! Synheart Stress - On-device stress detection from heart-rate windows
//!
//! Stress transforms short windows of heart-rate samples plus last night's
//! sleep into a bounded stress score through a deterministic pipeline:
//! RR conversion → ectopic filtering → PRSA/HRV features → baseline-aware
//! scoring with a sleep-adjusted threshold.
//!
//! ## Modules
//!
//! - **Numeric stages**: `rr`, `prsa`, `hrv`, `features`, `scorer`, `sleep`
//! - **Personalization**: `baseline` keeps a rolling calm-period DC/SDNN window
//! - **Orchestration**: `pipeline` drives the external `source` collaborators

pub mod baseline;
pub mod config;
pub mod error;
pub mod features;
pub mod hrv;
pub mod pipeline;
pub mod prsa;
pub mod rr;
pub mod scorer;
pub mod sleep;
pub mod source;
pub mod types;

pub use baseline::{lock_baseline, Baseline, BaselineCalibrator, BaselineReading, SharedBaseline};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::StressPipeline;
pub use source::{ActivityClassifier, FixedClassifier, MemorySampleSource, SampleSource};
pub use types::{
    ActivityClassification, ActivityType, HeartRateSample, PipelineResult, PipelineState,
    SleepQuality, StressLevel, StressMetrics,
};

/// Crate version embedded in CLI output
pub const STRESS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "synheart-stress";
