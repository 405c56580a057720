use featbench_core::params::parse_list;
use featbench_core::{Descriptor, Detector, MatcherKind, Roi, SelectorKind, Sweep};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{BenchError, Result};
use crate::types::ImageSequence;

/// Configuration for a benchmark sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Image files to process, in order
    #[serde(default)]
    pub images: ImageSequence,
    /// Parameter names to combine
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Keypoint region of interest
    #[serde(default)]
    pub roi: RoiConfig,
    /// Keep at most this many keypoints per image
    #[serde(default)]
    pub max_keypoints: Option<usize>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub backend: BackendKind,
}

impl BenchConfig {
    /// Load and validate a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BenchError::ConfigNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: BenchConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.images.end_index.checked_add(1).is_none() {
            return Err(BenchError::InvalidConfig(format!(
                "end_index {} is out of range",
                self.images.end_index
            )));
        }
        if self.images.is_empty() {
            return Err(BenchError::InvalidConfig(format!(
                "image range {}..={} is empty",
                self.images.start_index, self.images.end_index
            )));
        }
        if self.roi.enabled && self.roi.rect.is_empty() {
            return Err(BenchError::InvalidConfig(format!(
                "region of interest {:?} has no area",
                self.roi.rect
            )));
        }
        if self.max_keypoints == Some(0) {
            return Err(BenchError::InvalidConfig(
                "max_keypoints must be at least 1".to_string(),
            ));
        }
        if self.images.len() < 2 {
            log::warn!("Only one image configured; no matches will be recorded");
        }
        Ok(())
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub detectors: Option<Vec<String>>,
    pub descriptors: Option<Vec<String>>,
    pub matchers: Option<Vec<String>>,
    pub selectors: Option<Vec<String>>,
    pub images: Option<PathBuf>,
    pub end_index: Option<usize>,
    pub report: Option<PathBuf>,
    pub overwrite: bool,
    pub no_roi: bool,
    pub max_keypoints: Option<usize>,
    pub backend: Option<BackendKind>,
}

impl BenchConfig {
    /// Loads `path` (or the defaults), applies `overrides` and checks that
    /// every sweep name is known before any image is touched.
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => BenchConfig::load(path)?,
            None => BenchConfig::default(),
        };
        config.apply(overrides);
        config.validate()?;
        config.sweep.to_sweep()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(names) = &overrides.detectors {
            self.sweep.detectors = names.clone();
        }
        if let Some(names) = &overrides.descriptors {
            self.sweep.descriptors = names.clone();
        }
        if let Some(names) = &overrides.matchers {
            self.sweep.matchers = names.clone();
        }
        if let Some(names) = &overrides.selectors {
            self.sweep.selectors = names.clone();
        }
        if let Some(dir) = &overrides.images {
            self.images.base_path = dir.clone();
        }
        if let Some(end) = overrides.end_index {
            self.images.end_index = end;
        }
        if let Some(path) = &overrides.report {
            self.report.path = path.clone();
        }
        if overrides.overwrite {
            self.report.overwrite = true;
        }
        if overrides.no_roi {
            self.roi.enabled = false;
        }
        if overrides.max_keypoints.is_some() {
            self.max_keypoints = overrides.max_keypoints;
        }
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
    }
}

/// Names for each sweep dimension. Defaults to every known name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_detectors")]
    pub detectors: Vec<String>,
    #[serde(default = "default_descriptors")]
    pub descriptors: Vec<String>,
    #[serde(default = "default_matchers")]
    pub matchers: Vec<String>,
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,
}

fn names<T: fmt::Display>(all: &[T]) -> Vec<String> {
    all.iter().map(ToString::to_string).collect()
}

fn default_detectors() -> Vec<String> {
    names(Detector::ALL)
}

fn default_descriptors() -> Vec<String> {
    names(Descriptor::ALL)
}

fn default_matchers() -> Vec<String> {
    names(MatcherKind::ALL)
}

fn default_selectors() -> Vec<String> {
    names(SelectorKind::ALL)
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            detectors: default_detectors(),
            descriptors: default_descriptors(),
            matchers: default_matchers(),
            selectors: default_selectors(),
        }
    }
}

impl SweepConfig {
    /// Parses every name and expands the compatible combinations.
    pub fn to_sweep(&self) -> Result<Sweep> {
        let detectors: Vec<Detector> = parse_list(&self.detectors)?;
        let descriptors: Vec<Descriptor> = parse_list(&self.descriptors)?;
        let matchers: Vec<MatcherKind> = parse_list(&self.matchers)?;
        let selectors: Vec<SelectorKind> = parse_list(&self.selectors)?;
        Ok(Sweep::enumerate(&detectors, &descriptors, &matchers, &selectors))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub rect: Roi,
}

fn default_true() -> bool {
    true
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rect: Roi::default(),
        }
    }
}

impl RoiConfig {
    /// The region to filter by, if filtering is on.
    pub fn active(&self) -> Option<Roi> {
        self.enabled.then_some(self.rect)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
    /// Truncate instead of appending
    #[serde(default)]
    pub overwrite: bool,
}

fn default_report_path() -> PathBuf {
    PathBuf::from("feature_tracking_report.csv")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
            overwrite: false,
        }
    }
}

/// Which feature library runs the sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Native,
    Opencv,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => f.write_str("native"),
            BackendKind::Opencv => f.write_str("opencv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: BenchConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.images, ImageSequence::default());
        assert_eq!(config.sweep, SweepConfig::default());
        assert_eq!(config.roi.active(), Some(Roi::new(535, 180, 180, 150)));
        assert_eq!(config.max_keypoints, None);
        assert_eq!(config.report.path, PathBuf::from("feature_tracking_report.csv"));
        assert!(!config.report.overwrite);
        assert_eq!(config.backend, BackendKind::Native);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let yaml = r#"
images:
  base_path: /tmp/seq
  end_index: 3
sweep:
  detectors: [FAST, ORB]
  selectors: [SEL_KNN]
roi:
  enabled: false
max_keypoints: 50
backend: opencv
"#;
        let config: BenchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.images.base_path, PathBuf::from("/tmp/seq"));
        assert_eq!(config.images.fill_width, 4);
        assert_eq!(config.images.len(), 4);
        assert_eq!(config.sweep.detectors, ["FAST", "ORB"]);
        assert_eq!(config.sweep.matchers, ["MAT_BF", "MAT_FLANN"]);
        assert_eq!(config.roi.active(), None);
        assert_eq!(config.max_keypoints, Some(50));
        assert_eq!(config.backend, BackendKind::Opencv);
    }

    #[test]
    fn example_file_matches_defaults() {
        let config: BenchConfig =
            serde_yaml::from_str(include_str!("../../featbench.example.yaml")).unwrap();
        let defaults = BenchConfig::default();
        assert_eq!(config.images, defaults.images);
        assert_eq!(config.sweep, defaults.sweep);
        assert_eq!(config.roi, defaults.roi);
        assert_eq!(config.report, defaults.report);
    }

    #[test]
    fn default_sweep_expands_to_all_compatible_tuples() {
        let sweep = SweepConfig::default().to_sweep().unwrap();
        assert_eq!(sweep.accepted.len(), 120);
        assert_eq!(sweep.rejected.len(), 48);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let sweep = SweepConfig {
            descriptors: vec!["BRIEF".to_string(), "SURF".to_string()],
            ..SweepConfig::default()
        };
        let err = sweep.to_sweep().unwrap_err();
        assert!(matches!(err, BenchError::Param(_)));
        assert!(err.to_string().contains("SURF"));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = BenchConfig::default();
        assert!(config.validate().is_ok());

        config.roi.rect = Roi::new(0, 0, 0, 10);
        assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
        config.roi.enabled = false;
        assert!(config.validate().is_ok());

        config.max_keypoints = Some(0);
        assert!(config.validate().is_err());
        config.max_keypoints = None;

        config.images.start_index = 10;
        config.images.end_index = 2;
        assert!(config.validate().is_err());

        config.images.start_index = 0;
        config.images.end_index = usize::MAX;
        assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));
    }

    #[test]
    fn load_reads_and_validates_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "report:\n  path: out.csv\n  overwrite: true").unwrap();
        let config = BenchConfig::load(file.path()).unwrap();
        assert_eq!(config.report.path, PathBuf::from("out.csv"));
        assert!(config.report.overwrite);

        let missing = BenchConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(missing, BenchError::ConfigNotFound(_)));
    }
}
