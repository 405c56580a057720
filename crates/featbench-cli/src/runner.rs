use std::path::{Path, PathBuf};
use std::time::Instant;

use featbench_core::keypoint::retain_best;
use featbench_core::{
    Combination, CombinationRecord, DATA_BUFFER_SIZE, Detector, FeatureBackend, Frame, FrameBuffer,
    FrameSample, Roi, select_matches,
};
use log::{debug, info};

use crate::errors::Result;
use crate::types::BenchConfig;

/// Per-image filtering applied between detection and description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep only keypoints inside this region.
    pub roi: Option<Roi>,
    /// Keep at most this many keypoints.
    pub max_keypoints: Option<usize>,
}

impl From<&BenchConfig> for RunOptions {
    fn from(config: &BenchConfig) -> Self {
        Self {
            roi: config.roi.active(),
            max_keypoints: config.max_keypoints,
        }
    }
}

type BackendFrame<B> = Frame<<B as FeatureBackend>::Image, <B as FeatureBackend>::Descriptors>;

/// Runs combinations over an image sequence, two frames at a time.
pub struct BenchRunner<B: FeatureBackend> {
    backend: B,
    options: RunOptions,
    buffer: FrameBuffer<BackendFrame<B>>,
}

impl<B: FeatureBackend> BenchRunner<B> {
    pub fn new(backend: B, options: RunOptions) -> Self {
        Self {
            backend,
            options,
            buffer: FrameBuffer::new(DATA_BUFFER_SIZE),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Frames currently held, oldest first.
    pub fn buffer(&self) -> &FrameBuffer<BackendFrame<B>> {
        &self.buffer
    }

    /// Runs every combination in order. The first failure aborts the run.
    pub fn run_all(
        &mut self,
        combinations: &[Combination],
        images: &[PathBuf],
    ) -> Result<Vec<CombinationRecord>> {
        let mut records = Vec::with_capacity(combinations.len());
        for (idx, combination) in combinations.iter().enumerate() {
            info!(
                ">>> Combination {}/{}: {}",
                idx + 1,
                combinations.len(),
                combination
            );
            records.push(self.run_combination(*combination, images)?);
        }
        Ok(records)
    }

    pub fn run_combination(
        &mut self,
        combination: Combination,
        images: &[PathBuf],
    ) -> Result<CombinationRecord> {
        let start = Instant::now();
        self.buffer.clear();

        let mut record = CombinationRecord::new(combination);
        for (index, path) in images.iter().enumerate() {
            let sample = self.process_image(&combination, index, path)?;
            record.metrics.push(sample);
        }

        let summary = record.summary();
        info!(
            "<<< {} done in {:.2}s: {:.1} keypoints ({:.1} in region), {:.1} matches, detect {:.2}ms, describe {:.2}ms",
            combination,
            start.elapsed().as_secs_f64(),
            summary.mean_keypoints,
            summary.mean_keypoints_in_roi,
            summary.mean_matched,
            summary.mean_detection_ms,
            summary.mean_description_ms
        );
        Ok(record)
    }

    fn process_image(
        &mut self,
        combination: &Combination,
        index: usize,
        path: &Path,
    ) -> Result<FrameSample> {
        let image = self.backend.load_gray(path)?;
        debug!("  [{index}] loaded {}", path.display());

        let detect_start = Instant::now();
        let mut keypoints = self.backend.detect(&image, combination.detector)?;
        let detection_seconds = detect_start.elapsed().as_secs_f64();
        let detected = keypoints.len();
        debug!(
            "  [{index}] {} detection: {} keypoints in {:.2}ms",
            combination.detector,
            detected,
            detection_seconds * 1_000.0
        );

        if let Some(roi) = self.options.roi {
            roi.retain(&mut keypoints);
            debug!("  [{index}] {} keypoints inside {:?}", keypoints.len(), roi);
        }
        let keypoints_in_roi = keypoints.len();

        if let Some(max) = self.options.max_keypoints {
            if combination.detector == Detector::ShiTomasi {
                // already ordered by quality
                keypoints.truncate(max);
            } else {
                retain_best(&mut keypoints, max);
            }
            debug!("  [{index}] limited to {} keypoints", keypoints.len());
        }

        let describe_start = Instant::now();
        let descriptors = self
            .backend
            .describe(&image, &mut keypoints, combination.descriptor)?;
        let description_seconds = describe_start.elapsed().as_secs_f64();
        debug!(
            "  [{index}] {} description: {} rows in {:.2}ms",
            combination.descriptor,
            keypoints.len(),
            description_seconds * 1_000.0
        );

        let mut frame = Frame::new(image);
        frame.keypoints = keypoints;
        frame.descriptors = Some(descriptors);
        self.buffer.push(frame);

        let mut matched = None;
        if let Some((previous, current)) = self.buffer.previous_and_current_mut()
            && let (Some(source), Some(reference)) =
                (previous.descriptors.as_ref(), current.descriptors.as_ref())
        {
            let matches = select_matches(&mut self.backend, source, reference, combination)?;
            debug!(
                "  [{index}] {} / {}: {} matches",
                combination.matcher,
                combination.selector,
                matches.len()
            );
            matched = Some(matches.len());
            current.matches = matches;
        }

        Ok(FrameSample {
            keypoints: detected,
            keypoints_in_roi,
            matched,
            detection_seconds,
            description_seconds,
        })
    }
}
