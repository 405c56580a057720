use std::path::Path;

use thiserror::Error;

use crate::combination::Combination;
use crate::error::Result;
use crate::keypoint::{DMatch, KeyPoint};
use crate::params::{Descriptor, DescriptorKind, Detector, MatcherKind};

/// A parameter the backend has no implementation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unsupported {
    #[error("the {backend} backend has no {detector} detector")]
    Detector {
        backend: &'static str,
        detector: Detector,
    },
    #[error("the {backend} backend has no {descriptor} descriptor")]
    Descriptor {
        backend: &'static str,
        descriptor: Descriptor,
    },
    #[error("the {backend} backend has no {matcher} matcher")]
    Matcher {
        backend: &'static str,
        matcher: MatcherKind,
    },
}

/// The vision library the benchmark drives: detection, description and
/// descriptor matching.
pub trait FeatureBackend {
    type Image;
    type Descriptors;

    fn name(&self) -> &'static str;

    /// Whether every stage of the combination can run on this backend.
    fn supports(&self, combination: &Combination) -> std::result::Result<(), Unsupported>;

    /// Loads an image from disk as 8-bit grayscale.
    fn load_gray(&mut self, path: &Path) -> Result<Self::Image>;

    fn detect(&mut self, image: &Self::Image, detector: Detector) -> Result<Vec<KeyPoint>>;

    /// Describes `keypoints`, dropping those that cannot be described (e.g.
    /// too close to the border). Row `i` of the result belongs to
    /// `keypoints[i]` after the call.
    fn describe(
        &mut self,
        image: &Self::Image,
        keypoints: &mut Vec<KeyPoint>,
        descriptor: Descriptor,
    ) -> Result<Self::Descriptors>;

    /// Best reference match for every source descriptor.
    fn match_nearest(
        &mut self,
        source: &Self::Descriptors,
        reference: &Self::Descriptors,
        matcher: MatcherKind,
        kind: DescriptorKind,
    ) -> Result<Vec<DMatch>>;

    /// Up to `k` reference matches per source descriptor, nearest first.
    fn match_knn(
        &mut self,
        source: &Self::Descriptors,
        reference: &Self::Descriptors,
        matcher: MatcherKind,
        kind: DescriptorKind,
        k: usize,
    ) -> Result<Vec<Vec<DMatch>>>;
}
