//! Stress CLI - Command-line interface for Synheart Stress
//!
//! Commands:
//! - score: Evaluate a heart-rate window into a stress result
//! - calibrate: Add a calm-period reading to a baselines file
//! - baseline: Report personal baseline status

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use synheart_stress::types::ActivityType;
use synheart_stress::{
    lock_baseline, BaselineCalibrator, FixedClassifier, MemorySampleSource, PipelineConfig,
    PipelineError, StressPipeline, PRODUCER_NAME, STRESS_VERSION,
};

/// Stress - On-device stress detection from heart-rate windows
#[derive(Parser)]
#[command(name = "stress")]
#[command(author = "Synheart AI Inc")]
#[command(version = STRESS_VERSION)]
#[command(about = "Score stress from heart-rate windows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a heart-rate window and print the pipeline result
    Score {
        /// Window file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Load baselines from file
        #[arg(long)]
        baselines: Option<PathBuf>,

        /// Activity reported for the window
        #[arg(long, default_value = "cognitive")]
        activity: ActivityArg,

        /// Classifier confidence for the reported activity
        #[arg(long, default_value = "1.0")]
        confidence: f64,

        /// Evaluation time (RFC 3339); defaults to the latest sample
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// Add a calm-period reading to a baselines file
    Calibrate {
        /// Window file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Baselines file (created if missing)
        #[arg(long)]
        baselines: PathBuf,

        /// Pipeline configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Evaluation time (RFC 3339); defaults to the latest sample
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Report personal baseline status
    Baseline {
        /// Baselines file
        #[arg(long)]
        baselines: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActivityArg {
    Cognitive,
    Physical,
    Unknown,
}

impl From<ActivityArg> for ActivityType {
    fn from(arg: ActivityArg) -> Self {
        match arg {
            ActivityArg::Cognitive => ActivityType::Cognitive,
            ActivityArg::Physical => ActivityType::Physical,
            ActivityArg::Unknown => ActivityType::Unknown,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StressCliError> {
    match cli.command {
        Commands::Score {
            input,
            config,
            baselines,
            activity,
            confidence,
            at,
            pretty,
        } => {
            cmd_score(
                &input,
                config.as_deref(),
                baselines.as_deref(),
                activity.into(),
                confidence,
                at,
                pretty,
            )
            .await
        }
        Commands::Calibrate {
            input,
            baselines,
            config,
            at,
        } => cmd_calibrate(&input, &baselines, config.as_deref(), at).await,
        Commands::Baseline { baselines, json } => cmd_baseline(&baselines, json),
    }
}

async fn cmd_score(
    input: &Path,
    config: Option<&Path>,
    baselines: Option<&Path>,
    activity: ActivityType,
    confidence: f64,
    at: Option<DateTime<Utc>>,
    pretty: bool,
) -> Result<(), StressCliError> {
    let config = load_config(config)?;
    let source = read_window(input)?;
    let now = evaluation_time(&source, at)?;

    let calibrator = match baselines {
        Some(path) => BaselineCalibrator::from_json(&fs::read_to_string(path)?)?,
        None => config.baseline_calibrator(),
    };

    let pipeline = StressPipeline::with_config(
        source,
        FixedClassifier::new(activity, confidence),
        calibrator.into_shared(),
        config,
    );

    let result = pipeline.run_at(now).await?;

    let output = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);

    Ok(())
}

async fn cmd_calibrate(
    input: &Path,
    baselines: &Path,
    config: Option<&Path>,
    at: Option<DateTime<Utc>>,
) -> Result<(), StressCliError> {
    let config = load_config(config)?;
    let source = read_window(input)?;
    let now = evaluation_time(&source, at)?;

    let calibrator = if baselines.exists() {
        BaselineCalibrator::from_json(&fs::read_to_string(baselines)?)?
    } else {
        config.baseline_calibrator()
    };

    // Calibration never consults the classifier
    let pipeline = StressPipeline::with_config(
        source,
        FixedClassifier::new(ActivityType::Unknown, 0.0),
        calibrator.into_shared(),
        config,
    );

    let reading = pipeline.calibrate_at(now).await?;

    let shared = pipeline.baseline();
    let calibrator = lock_baseline(&shared);
    fs::write(baselines, calibrator.to_json()?)?;

    let report = BaselineReport::from_calibrator(&calibrator);
    let outcome = serde_json::json!({
        "added": reading,
        "baseline": report,
    });
    println!("{}", serde_json::to_string(&outcome)?);

    if reading.is_none() {
        return Err(StressCliError::WindowRejected);
    }

    Ok(())
}

fn cmd_baseline(baselines: &Path, json: bool) -> Result<(), StressCliError> {
    let calibrator = BaselineCalibrator::from_json(&fs::read_to_string(baselines)?)?;
    let report = BaselineReport::from_calibrator(&calibrator);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Stress Baseline Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("Readings: {}/{}", report.readings, report.capacity);

        match (report.baseline_dc, report.baseline_sdnn) {
            (Some(dc), Some(sdnn)) => {
                println!("  [OK] DC:   {:.2} ms", dc);
                println!("  [OK] SDNN: {:.2} ms", sdnn);
            }
            _ => println!("  [WARN] Not enough readings for a personal baseline"),
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, StressCliError> {
    match path {
        Some(path) => Ok(PipelineConfig::load(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn read_window(input: &Path) -> Result<MemorySampleSource, StressCliError> {
    let data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(StressCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    Ok(MemorySampleSource::from_json(&data)?)
}

fn evaluation_time(
    source: &MemorySampleSource,
    at: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, StressCliError> {
    at.or_else(|| source.latest_timestamp())
        .ok_or(StressCliError::NoSamples)
}

// Report types

#[derive(serde::Serialize)]
struct BaselineReport {
    producer: String,
    version: String,
    readings: usize,
    capacity: usize,
    has_baseline: bool,
    baseline_dc: Option<f64>,
    baseline_sdnn: Option<f64>,
}

impl BaselineReport {
    fn from_calibrator(calibrator: &BaselineCalibrator) -> Self {
        Self {
            producer: PRODUCER_NAME.to_string(),
            version: STRESS_VERSION.to_string(),
            readings: calibrator.len(),
            capacity: calibrator.capacity(),
            has_baseline: calibrator.has_baseline(),
            baseline_dc: calibrator.baseline_dc(),
            baseline_sdnn: calibrator.baseline_sdnn(),
        }
    }
}

// Error types

#[derive(Debug)]
enum StressCliError {
    Io(io::Error),
    Pipeline(PipelineError),
    Json(serde_json::Error),
    NoInput,
    NoSamples,
    WindowRejected,
}

impl From<io::Error> for StressCliError {
    fn from(e: io::Error) -> Self {
        StressCliError::Io(e)
    }
}

impl From<PipelineError> for StressCliError {
    fn from(e: PipelineError) -> Self {
        StressCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for StressCliError {
    fn from(e: serde_json::Error) -> Self {
        StressCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StressCliError> for CliError {
    fn from(e: StressCliError) -> Self {
        match e {
            StressCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StressCliError::Pipeline(e) => {
                let hint = match e {
                    PipelineError::InvalidConfig(_) => "Check the configuration file values",
                    PipelineError::InvalidBaseline(_) => "Recreate the baselines file with 'stress calibrate'",
                    _ => "Ensure the window file matches the expected format",
                };
                CliError {
                    code: "PIPELINE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            StressCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            StressCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal, expected piped window data".to_string(),
                hint: Some("Pipe a window file or pass --input <path>".to_string()),
            },
            StressCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No heart-rate samples found in input".to_string(),
                hint: Some("Ensure input contains heart_rate samples or pass --at".to_string()),
            },
            StressCliError::WindowRejected => CliError {
                code: "WINDOW_REJECTED".to_string(),
                message: "Calibration window produced no DC/SDNN reading".to_string(),
                hint: Some("Record a longer, still period with steady heart rate".to_string()),
            },
        }
    }
}
