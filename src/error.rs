//! Error types for Synheart Stress

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur around the stress pipeline.
///
/// The numeric stages never fail; missing data is expressed as `Option`.
/// Only sample acquisition, configuration and persisted state can error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Sample acquisition failed: {0}")]
    Acquisition(String),

    #[error("Sample acquisition timed out after {0:?}")]
    AcquisitionTimeout(Duration),

    #[error("Activity classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid baseline state: {0}")]
    InvalidBaseline(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
