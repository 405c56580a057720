pub mod errors;
#[cfg(feature = "opencv")]
pub mod opencv_backend;
pub mod output;
pub mod runner;
pub mod types;

use featbench_core::{CombinationRecord, FeatureBackend, NativeBackend};
use log::info;

use crate::errors::{BenchError, Result};
use crate::output::CsvReport;
use crate::runner::{BenchRunner, RunOptions};
use crate::types::{BackendKind, BenchConfig};

/// Outcome of a full sweep.
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    pub backend: &'static str,
    pub records: Vec<CombinationRecord>,
    /// Combinations dropped before running.
    pub skipped: usize,
}

/// Expands the sweep, runs it on the configured backend and writes the report.
pub fn run_benchmark(config: &BenchConfig) -> Result<BenchOutcome> {
    config.validate()?;
    match config.backend {
        BackendKind::Native => run_with(NativeBackend::new(), config),
        #[cfg(feature = "opencv")]
        BackendKind::Opencv => run_with(opencv_backend::OpenCvBackend::new(), config),
        #[cfg(not(feature = "opencv"))]
        BackendKind::Opencv => Err(BenchError::BackendUnavailable(BackendKind::Opencv.to_string())),
    }
}

/// Runs the sweep on an explicit backend.
pub fn run_with<B: FeatureBackend>(backend: B, config: &BenchConfig) -> Result<BenchOutcome> {
    let mut sweep = config.sweep.to_sweep()?;
    sweep.retain_supported(&backend);
    let skipped = sweep.rejected.len();
    if sweep.accepted.is_empty() {
        return Err(BenchError::EmptySweep);
    }

    let images = config.images.paths();
    info!(
        "Running {} combinations ({} skipped) on the {} backend over {} images",
        sweep.accepted.len(),
        skipped,
        backend.name(),
        images.len()
    );

    let name = backend.name();
    let mut runner = BenchRunner::new(backend, RunOptions::from(config));
    let records = runner.run_all(&sweep.accepted, &images)?;

    CsvReport::new(&config.report.path, config.report.overwrite).save(&records)?;

    Ok(BenchOutcome {
        backend: name,
        records,
        skipped,
    })
}
