use std::path::Path;

use featbench_cli::errors::BenchError;
use featbench_cli::types::{BackendKind, BenchConfig, ImageSequence, ReportConfig, RoiConfig, SweepConfig};
use featbench_cli::{run_benchmark, run_with};
use featbench_core::{NativeBackend, Roi};
use image::{GrayImage, Luma};
use tempfile::tempdir;

/// Blocky scene drifting two pixels to the right per frame.
fn write_sequence(dir: &Path, frames: usize) {
    for frame in 0..frames {
        let shift = 2 * frame as u32;
        let image = GrayImage::from_fn(200, 160, |x, y| {
            let x = x + 64 - shift;
            if ((x / 16) + (y / 16)) % 3 == 0 {
                Luma([210])
            } else {
                Luma([40])
            }
        });
        image
            .save(dir.join(format!("frame_{frame:04}.png")))
            .expect("write test frame");
    }
}

fn config_for(dir: &Path, frames: usize) -> BenchConfig {
    BenchConfig {
        images: ImageSequence {
            base_path: dir.to_path_buf(),
            prefix: "frame_".to_string(),
            extension: ".png".to_string(),
            start_index: 0,
            end_index: frames - 1,
            fill_width: 4,
        },
        sweep: SweepConfig {
            detectors: vec!["FAST".to_string()],
            descriptors: vec!["ORB".to_string(), "BRIEF".to_string()],
            matchers: vec!["MAT_BF".to_string()],
            selectors: vec!["SEL_NN".to_string(), "SEL_KNN".to_string()],
        },
        roi: RoiConfig {
            enabled: false,
            rect: Roi::default(),
        },
        max_keypoints: None,
        report: ReportConfig {
            path: dir.join("report.csv"),
            overwrite: true,
        },
        backend: BackendKind::Native,
    }
}

#[test]
fn sweep_records_every_image_and_writes_the_report() {
    let dir = tempdir().unwrap();
    write_sequence(dir.path(), 3);
    let config = config_for(dir.path(), 3);

    let outcome = run_benchmark(&config).unwrap();
    assert_eq!(outcome.backend, "native");
    assert_eq!(outcome.records.len(), 4);
    assert_eq!(outcome.skipped, 0);

    for record in &outcome.records {
        let m = &record.metrics;
        assert_eq!(m.frames(), 3, "{}", record.combination);
        assert!(m.keypoints.iter().all(|&n| n > 0));
        assert_eq!(m.keypoints_in_roi, m.keypoints);
        assert_eq!(m.matched[0], None);
        assert!(m.matched[1].is_some() && m.matched[2].is_some());
        assert!(m.detection_seconds.iter().all(|&t| t >= 0.0));
    }

    let report = std::fs::read_to_string(dir.path().join("report.csv")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 6, "header, four rows, blank line");
    assert!(lines[0].starts_with("Detector;Descriptor;Matcher;DescriptorType;Selector;numKeypoint_0;"));
    assert!(lines[1].starts_with("FAST;ORB;MAT_BF;DES_BINARY;SEL_NN;"));
    assert!(lines[4].starts_with("FAST;BRIEF;MAT_BF;DES_BINARY;SEL_KNN;"));
    assert!(lines[1..5].iter().all(|l| l.ends_with(';')));
    assert_eq!(lines[5], "");
}

#[test]
fn region_of_interest_limits_counted_keypoints() {
    let dir = tempdir().unwrap();
    write_sequence(dir.path(), 2);
    let mut config = config_for(dir.path(), 2);
    config.sweep.descriptors = vec!["BRIEF".to_string()];
    config.sweep.selectors = vec!["SEL_NN".to_string()];
    config.roi = RoiConfig {
        enabled: true,
        rect: Roi::new(40, 40, 100, 80),
    };

    let outcome = run_benchmark(&config).unwrap();
    let m = &outcome.records[0].metrics;
    assert!(m.keypoints_in_roi.iter().zip(&m.keypoints).all(|(r, k)| r < k));
    assert!(m.matched[1].unwrap() <= m.keypoints_in_roi[0].max(m.keypoints_in_roi[1]));
}

#[test]
fn default_sweep_skips_what_the_native_backend_lacks() {
    let dir = tempdir().unwrap();
    write_sequence(dir.path(), 2);
    let mut config = config_for(dir.path(), 2);
    config.sweep = SweepConfig::default();

    let outcome = run_with(NativeBackend::new(), &config).unwrap();
    // 4 detectors x 2 descriptors x MAT_BF x 2 selectors
    assert_eq!(outcome.records.len(), 16);
    assert_eq!(outcome.skipped, 7 * 6 * 2 * 2 - 16);
}

#[test]
fn unknown_names_and_missing_images_fail() {
    let dir = tempdir().unwrap();
    let mut config = config_for(dir.path(), 2);

    config.sweep.detectors = vec!["SURF".to_string()];
    assert!(matches!(run_benchmark(&config), Err(BenchError::Param(_))));

    config.sweep.detectors = vec!["FAST".to_string()];
    assert!(matches!(run_benchmark(&config), Err(BenchError::Feature(_))));
    assert!(!dir.path().join("report.csv").exists());

    config.sweep.matchers = vec!["MAT_FLANN".to_string()];
    assert!(matches!(run_benchmark(&config), Err(BenchError::EmptySweep)));
}

#[cfg(not(feature = "opencv"))]
#[test]
fn opencv_backend_needs_the_feature() {
    let dir = tempdir().unwrap();
    let mut config = config_for(dir.path(), 2);
    config.backend = BackendKind::Opencv;
    assert!(matches!(run_benchmark(&config), Err(BenchError::BackendUnavailable(_))));
}
