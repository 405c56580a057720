use std::fmt;

use log::{debug, warn};
use thiserror::Error;

use crate::backend::{FeatureBackend, Unsupported};
use crate::params::{Descriptor, DescriptorKind, Detector, MatcherKind, SelectorKind};

/// One (detector, descriptor, matcher, selector) tuple of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combination {
    pub detector: Detector,
    pub descriptor: Descriptor,
    pub matcher: MatcherKind,
    pub descriptor_kind: DescriptorKind,
    pub selector: SelectorKind,
}

impl Combination {
    pub fn new(
        detector: Detector,
        descriptor: Descriptor,
        matcher: MatcherKind,
        selector: SelectorKind,
    ) -> Self {
        Self {
            detector,
            descriptor,
            matcher,
            descriptor_kind: DescriptorKind::for_descriptor(descriptor),
            selector,
        }
    }

    /// The five identifying report fields, in column order.
    pub fn fields(&self) -> [&'static str; 5] {
        [
            self.detector.as_str(),
            self.descriptor.as_str(),
            self.matcher.as_str(),
            self.descriptor_kind.as_str(),
            self.selector.as_str(),
        ]
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{} ({}, {}, {})",
            self.detector, self.descriptor, self.matcher, self.descriptor_kind, self.selector
        )
    }
}

/// Detector/descriptor pairings that cannot work together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Incompatibility {
    #[error("SIFT keypoints cannot be described with ORB")]
    SiftKeypointsWithOrb,
    #[error("AKAZE keypoints can only be described with AKAZE")]
    AkazeKeypointsNeedAkaze,
    #[error("the AKAZE descriptor needs AKAZE keypoints")]
    AkazeDescriptorNeedsAkazeKeypoints,
}

impl Incompatibility {
    pub fn check(detector: Detector, descriptor: Descriptor) -> Option<Self> {
        match (detector, descriptor) {
            (Detector::Sift, Descriptor::Orb) => Some(Self::SiftKeypointsWithOrb),
            (Detector::Akaze, d) if d != Descriptor::Akaze => Some(Self::AkazeKeypointsNeedAkaze),
            (d, Descriptor::Akaze) if d != Detector::Akaze => {
                Some(Self::AkazeDescriptorNeedsAkazeKeypoints)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error(transparent)]
    Incompatible(#[from] Incompatibility),
    #[error(transparent)]
    Unsupported(#[from] Unsupported),
}

/// The valid tuples of a parameter sweep, plus the ones that were dropped.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    pub accepted: Vec<Combination>,
    pub rejected: Vec<(Combination, RejectReason)>,
}

impl Sweep {
    /// Expands the cartesian product (detector outermost, selector innermost)
    /// and drops incompatible detector/descriptor pairs.
    pub fn enumerate(
        detectors: &[Detector],
        descriptors: &[Descriptor],
        matchers: &[MatcherKind],
        selectors: &[SelectorKind],
    ) -> Self {
        let mut sweep = Sweep::default();
        for &detector in detectors {
            for &descriptor in descriptors {
                for &matcher in matchers {
                    for &selector in selectors {
                        let combination = Combination::new(detector, descriptor, matcher, selector);
                        match Incompatibility::check(detector, descriptor) {
                            Some(reason) => {
                                debug!("Invalid combination: {combination}: {reason}");
                                sweep.rejected.push((combination, reason.into()));
                            }
                            None => sweep.accepted.push(combination),
                        }
                    }
                }
            }
        }
        sweep
    }

    /// Moves the tuples the backend cannot run into the rejected list.
    pub fn retain_supported<B: FeatureBackend>(&mut self, backend: &B) {
        let mut accepted = Vec::with_capacity(self.accepted.len());
        for combination in self.accepted.drain(..) {
            match backend.supports(&combination) {
                Ok(()) => accepted.push(combination),
                Err(reason) => {
                    warn!("Skipping {combination}: {reason}");
                    self.rejected.push((combination, reason.into()));
                }
            }
        }
        self.accepted = accepted;
    }
}

/// Measurements taken on a single image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub keypoints: usize,
    pub keypoints_in_roi: usize,
    /// `None` for the first image, which has nothing to match against.
    pub matched: Option<usize>,
    pub detection_seconds: f64,
    pub description_seconds: f64,
}

/// Per-image metric sequences; every processed image appends to all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMetrics {
    pub keypoints: Vec<usize>,
    pub keypoints_in_roi: Vec<usize>,
    pub matched: Vec<Option<usize>>,
    pub detection_seconds: Vec<f64>,
    pub description_seconds: Vec<f64>,
}

impl FrameMetrics {
    pub fn push(&mut self, sample: FrameSample) {
        self.keypoints.push(sample.keypoints);
        self.keypoints_in_roi.push(sample.keypoints_in_roi);
        self.matched.push(sample.matched);
        self.detection_seconds.push(sample.detection_seconds);
        self.description_seconds.push(sample.description_seconds);
    }

    pub fn frames(&self) -> usize {
        self.keypoints.len()
    }
}

/// Averages over the processed images of one combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSummary {
    pub frames: usize,
    pub mean_keypoints: f64,
    pub mean_keypoints_in_roi: f64,
    pub mean_matched: f64,
    pub mean_detection_ms: f64,
    pub mean_description_ms: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// A combination and everything measured while running it.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationRecord {
    pub combination: Combination,
    pub metrics: FrameMetrics,
}

impl CombinationRecord {
    pub fn new(combination: Combination) -> Self {
        Self {
            combination,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let m = &self.metrics;
        MetricsSummary {
            frames: m.frames(),
            mean_keypoints: mean(m.keypoints.iter().map(|&v| v as f64)),
            mean_keypoints_in_roi: mean(m.keypoints_in_roi.iter().map(|&v| v as f64)),
            mean_matched: mean(m.matched.iter().flatten().map(|&v| v as f64)),
            mean_detection_ms: mean(m.detection_seconds.iter().map(|&s| s * 1_000.0)),
            mean_description_ms: mean(m.description_seconds.iter().map(|&s| s * 1_000.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn incompatibility_rules() {
        assert_eq!(
            Incompatibility::check(Detector::Sift, Descriptor::Orb),
            Some(Incompatibility::SiftKeypointsWithOrb)
        );
        assert_eq!(
            Incompatibility::check(Detector::Akaze, Descriptor::Brief),
            Some(Incompatibility::AkazeKeypointsNeedAkaze)
        );
        assert_eq!(
            Incompatibility::check(Detector::Fast, Descriptor::Akaze),
            Some(Incompatibility::AkazeDescriptorNeedsAkazeKeypoints)
        );
        assert_eq!(Incompatibility::check(Detector::Akaze, Descriptor::Akaze), None);
        assert_eq!(Incompatibility::check(Detector::Sift, Descriptor::Sift), None);
        assert_eq!(Incompatibility::check(Detector::Orb, Descriptor::Orb), None);
    }

    #[test]
    fn full_sweep_counts() {
        let sweep = Sweep::enumerate(
            Detector::ALL,
            Descriptor::ALL,
            MatcherKind::ALL,
            SelectorKind::ALL,
        );
        // 7 x 6 pairs, 12 of them invalid, 4 matcher/selector variants each
        assert_eq!(sweep.accepted.len(), 30 * 4);
        assert_eq!(sweep.rejected.len(), 12 * 4);
        assert!(
            sweep
                .accepted
                .iter()
                .all(|c| Incompatibility::check(c.detector, c.descriptor).is_none())
        );
    }

    #[test]
    fn sweep_order_is_detector_major() {
        let sweep = Sweep::enumerate(
            &[Detector::Fast, Detector::Orb],
            &[Descriptor::Brief],
            &[MatcherKind::BruteForce],
            &[SelectorKind::NearestNeighbour, SelectorKind::KNearest],
        );
        let order: Vec<_> = sweep
            .accepted
            .iter()
            .map(|c| (c.detector, c.selector))
            .collect();
        assert_eq!(
            order,
            vec![
                (Detector::Fast, SelectorKind::NearestNeighbour),
                (Detector::Fast, SelectorKind::KNearest),
                (Detector::Orb, SelectorKind::NearestNeighbour),
                (Detector::Orb, SelectorKind::KNearest),
            ]
        );
    }

    #[test]
    fn unsupported_tuples_move_to_rejected() {
        let mut sweep = Sweep::enumerate(
            &[Detector::Fast, Detector::Brisk],
            &[Descriptor::Orb],
            MatcherKind::ALL,
            &[SelectorKind::NearestNeighbour],
        );
        assert_eq!(sweep.accepted.len(), 4);

        sweep.retain_supported(&crate::features::NativeBackend::new());

        assert_eq!(
            sweep.accepted,
            vec![Combination::new(
                Detector::Fast,
                Descriptor::Orb,
                MatcherKind::BruteForce,
                SelectorKind::NearestNeighbour,
            )]
        );
        assert_eq!(sweep.rejected.len(), 3);
        assert!(
            sweep
                .rejected
                .iter()
                .all(|(_, reason)| matches!(reason, RejectReason::Unsupported(_)))
        );
    }

    #[test]
    fn descriptor_kind_is_derived() {
        let c = Combination::new(
            Detector::Sift,
            Descriptor::Sift,
            MatcherKind::Flann,
            SelectorKind::KNearest,
        );
        assert_eq!(c.descriptor_kind, DescriptorKind::Hog);
        assert_eq!(c.fields(), ["SIFT", "SIFT", "MAT_FLANN", "DES_HOG", "SEL_KNN"]);
    }

    #[test]
    fn metrics_append_one_value_per_frame() {
        let mut record = CombinationRecord::new(Combination::new(
            Detector::Fast,
            Descriptor::Brief,
            MatcherKind::BruteForce,
            SelectorKind::NearestNeighbour,
        ));
        record.metrics.push(FrameSample {
            keypoints: 100,
            keypoints_in_roi: 10,
            matched: None,
            detection_seconds: 0.002,
            description_seconds: 0.001,
        });
        record.metrics.push(FrameSample {
            keypoints: 120,
            keypoints_in_roi: 14,
            matched: Some(8),
            detection_seconds: 0.004,
            description_seconds: 0.003,
        });

        let m = &record.metrics;
        assert_eq!(m.frames(), 2);
        assert_eq!(m.matched, vec![None, Some(8)]);
        assert_eq!(m.description_seconds.len(), 2);

        let summary = record.summary();
        assert_eq!(summary.frames, 2);
        assert_relative_eq!(summary.mean_keypoints, 110.0);
        assert_relative_eq!(summary.mean_matched, 8.0);
        assert_relative_eq!(summary.mean_detection_ms, 3.0, epsilon = 1e-9);
    }
}
