use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use featbench_cli::run_benchmark;
use featbench_cli::types::{BackendKind, BenchConfig, ConfigOverrides};
use log::{debug, error, info};

/// Benchmarks keypoint detector, descriptor, matcher and selector combinations
/// over an image sequence.
#[derive(Parser, Debug)]
#[command(name = "featbench", version, about)]
struct CliArgs {
    /// YAML configuration file.
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Detector names to sweep (e.g. FAST,ORB).
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    detectors: Option<Vec<String>>,
    /// Descriptor names to sweep.
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    descriptors: Option<Vec<String>>,
    /// Matcher names to sweep (MAT_BF, MAT_FLANN).
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    matchers: Option<Vec<String>>,
    /// Selector names to sweep (SEL_NN, SEL_KNN).
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    selectors: Option<Vec<String>>,
    /// Directory the image prefix is relative to.
    #[arg(long, value_name = "DIR")]
    images: Option<PathBuf>,
    /// Last image index (inclusive).
    #[arg(long, value_name = "N")]
    end_index: Option<usize>,
    /// Report file.
    #[arg(long, short, value_name = "FILE")]
    report: Option<PathBuf>,
    /// Truncate the report instead of appending to it.
    #[arg(long)]
    overwrite: bool,
    /// Keep keypoints from the whole image instead of the vehicle region.
    #[arg(long)]
    no_roi: bool,
    /// Keep at most N keypoints per image.
    #[arg(long, value_name = "N")]
    max_keypoints: Option<usize>,
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,
    /// Log verbosity; RUST_LOG takes precedence.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn init_logger(level: LogLevel) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .target(env_logger::Target::Stderr)
        .init();
}

impl CliArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            detectors: self.detectors.clone(),
            descriptors: self.descriptors.clone(),
            matchers: self.matchers.clone(),
            selectors: self.selectors.clone(),
            images: self.images.clone(),
            end_index: self.end_index,
            report: self.report.clone(),
            overwrite: self.overwrite,
            no_roi: self.no_roi,
            max_keypoints: self.max_keypoints,
            backend: self.backend,
        }
    }
}

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = CliArgs::parse();
    init_logger(cli.log_level);

    let config = match BenchConfig::resolve(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(2);
        }
    };
    debug!("Effective configuration: {config:?}");

    match run_benchmark(&config) {
        Ok(outcome) => {
            info!(
                "Finished {} combinations on the {} backend ({} skipped) in {:.1}s; report at {}",
                outcome.records.len(),
                outcome.backend,
                outcome.skipped,
                start.elapsed().as_secs_f64(),
                config.report.path.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
