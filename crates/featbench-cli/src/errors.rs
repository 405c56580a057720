use featbench_core::{FeatureError, ParamError};
use thiserror::Error;

/// Errors that can occur while running a benchmark sweep
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid parameter: {0}")]
    Param(#[from] ParamError),

    #[error("Feature backend error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No combination left to run after filtering the sweep")]
    EmptySweep,

    #[error("Backend '{0}' is not available in this build (enable the '{0}' feature)")]
    BackendUnavailable(String),
}

pub type Result<T> = std::result::Result<T, BenchError>;
