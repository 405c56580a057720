use std::io::Write;
use std::path::PathBuf;

use featbench_cli::errors::BenchError;
use featbench_cli::types::{BackendKind, BenchConfig, ConfigOverrides};
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

const FILE: &str = r#"
images:
  base_path: /data/seq
  end_index: 5
sweep:
  detectors: [HARRIS]
  selectors: [SEL_NN]
roi:
  enabled: true
max_keypoints: 20
report:
  path: from_file.csv
backend: opencv
"#;

#[test]
fn flags_take_precedence_over_the_file() {
    let file = config_file(FILE);
    let overrides = ConfigOverrides {
        detectors: Some(vec!["FAST".to_string(), "ORB".to_string()]),
        end_index: Some(2),
        report: Some(PathBuf::from("from_flag.csv")),
        overwrite: true,
        no_roi: true,
        backend: Some(BackendKind::Native),
        ..ConfigOverrides::default()
    };

    let config = BenchConfig::resolve(Some(file.path()), &overrides).unwrap();
    assert_eq!(config.sweep.detectors, ["FAST", "ORB"]);
    assert_eq!(config.images.end_index, 2);
    assert_eq!(config.report.path, PathBuf::from("from_flag.csv"));
    assert!(config.report.overwrite);
    assert_eq!(config.roi.active(), None);
    assert_eq!(config.backend, BackendKind::Native);

    // untouched by flags
    assert_eq!(config.images.base_path, PathBuf::from("/data/seq"));
    assert_eq!(config.sweep.selectors, ["SEL_NN"]);
    assert_eq!(config.max_keypoints, Some(20));
}

#[test]
fn no_flags_keep_the_file_values() {
    let file = config_file(FILE);
    let config = BenchConfig::resolve(Some(file.path()), &ConfigOverrides::default()).unwrap();
    assert_eq!(config.sweep.detectors, ["HARRIS"]);
    assert_eq!(config.report.path, PathBuf::from("from_file.csv"));
    assert!(!config.report.overwrite);
    assert!(config.roi.active().is_some());
    assert_eq!(config.backend, BackendKind::Opencv);
}

#[test]
fn unknown_flag_name_is_a_parameter_error() {
    let overrides = ConfigOverrides {
        descriptors: Some(vec!["BRIEF".to_string(), "SURF".to_string()]),
        ..ConfigOverrides::default()
    };
    let err = BenchConfig::resolve(None, &overrides).unwrap_err();
    assert!(matches!(err, BenchError::Param(_)));
    assert!(err.to_string().contains("SURF"));
}

#[test]
fn invalid_flag_values_are_rejected() {
    let overrides = ConfigOverrides {
        end_index: Some(usize::MAX),
        ..ConfigOverrides::default()
    };
    assert!(matches!(
        BenchConfig::resolve(None, &overrides),
        Err(BenchError::InvalidConfig(_))
    ));

    let overrides = ConfigOverrides {
        max_keypoints: Some(0),
        ..ConfigOverrides::default()
    };
    assert!(matches!(
        BenchConfig::resolve(None, &overrides),
        Err(BenchError::InvalidConfig(_))
    ));
}

#[test]
fn missing_config_file_is_reported() {
    let err = BenchConfig::resolve(
        Some(PathBuf::from("/definitely/not/here.yaml").as_path()),
        &ConfigOverrides::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BenchError::ConfigNotFound(_)));
}
