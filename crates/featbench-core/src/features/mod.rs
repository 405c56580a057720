//! Pure Rust feature pipeline.
//!
//! Covers the gradient and segment-test detectors, the two binary
//! descriptors and exhaustive matching. Anything else is reported through
//! [`FeatureBackend::supports`] so the sweep can skip it.

pub mod describe;
pub mod detect;
pub mod matcher;

use std::path::Path;

use image::GrayImage;
use log::trace;

use crate::backend::{FeatureBackend, Unsupported};
use crate::combination::Combination;
use crate::error::{FeatureError, Result};
use crate::keypoint::{DMatch, KeyPoint};
use crate::params::{Descriptor, DescriptorKind, Detector, MatcherKind};

use describe::{BinaryDescriptor, BriefDescriptor, OrbDescriptor, OrbDescriptorConfig};
use detect::{
    FastConfig, FastDetector, HarrisConfig, HarrisDetector, OrbConfig, OrbDetector, ShiTomasiConfig,
    ShiTomasiDetector,
};
use matcher::{BruteForceMatcher, Norm};

const BACKEND_NAME: &str = "native";

#[derive(Debug, Clone)]
pub struct NativeBackend {
    shi_tomasi: ShiTomasiDetector,
    harris: HarrisDetector,
    fast: FastDetector,
    orb_detector: OrbDetector,
    brief: BriefDescriptor,
    orb_descriptor: OrbDescriptor,
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend {
    pub fn new() -> Self {
        Self {
            shi_tomasi: ShiTomasiDetector::new(ShiTomasiConfig::default()),
            harris: HarrisDetector::new(HarrisConfig::default()),
            fast: FastDetector::new(FastConfig::default()),
            orb_detector: OrbDetector::new(OrbConfig::default()),
            brief: BriefDescriptor::default(),
            orb_descriptor: OrbDescriptor::new(OrbDescriptorConfig::default()),
        }
    }

    fn check_detector(detector: Detector) -> std::result::Result<(), Unsupported> {
        match detector {
            Detector::ShiTomasi | Detector::Harris | Detector::Fast | Detector::Orb => Ok(()),
            Detector::Brisk | Detector::Akaze | Detector::Sift => Err(Unsupported::Detector {
                backend: BACKEND_NAME,
                detector,
            }),
        }
    }

    fn check_descriptor(descriptor: Descriptor) -> std::result::Result<(), Unsupported> {
        match descriptor {
            Descriptor::Brief | Descriptor::Orb => Ok(()),
            Descriptor::Brisk | Descriptor::Freak | Descriptor::Akaze | Descriptor::Sift => {
                Err(Unsupported::Descriptor {
                    backend: BACKEND_NAME,
                    descriptor,
                })
            }
        }
    }

    fn matcher_for(matcher: MatcherKind, kind: DescriptorKind) -> Result<BruteForceMatcher> {
        match matcher {
            MatcherKind::BruteForce => Ok(BruteForceMatcher::new(Norm::for_kind(kind))),
            MatcherKind::Flann => Err(Unsupported::Matcher {
                backend: BACKEND_NAME,
                matcher,
            }
            .into()),
        }
    }
}

impl FeatureBackend for NativeBackend {
    type Image = GrayImage;
    type Descriptors = Vec<BinaryDescriptor>;

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn supports(&self, combination: &Combination) -> std::result::Result<(), Unsupported> {
        Self::check_detector(combination.detector)?;
        Self::check_descriptor(combination.descriptor)?;
        if combination.matcher == MatcherKind::Flann {
            return Err(Unsupported::Matcher {
                backend: BACKEND_NAME,
                matcher: combination.matcher,
            });
        }
        Ok(())
    }

    fn load_gray(&mut self, path: &Path) -> Result<GrayImage> {
        let image = image::open(path).map_err(|source| FeatureError::Image {
            path: path.display().to_string(),
            source,
        })?;
        let gray = image.to_luma8();
        trace!("Loaded {} ({}x{})", path.display(), gray.width(), gray.height());
        Ok(gray)
    }

    fn detect(&mut self, image: &GrayImage, detector: Detector) -> Result<Vec<KeyPoint>> {
        match detector {
            Detector::ShiTomasi => Ok(self.shi_tomasi.detect(image)),
            Detector::Harris => Ok(self.harris.detect(image)),
            Detector::Fast => Ok(self.fast.detect(image)),
            Detector::Orb => Ok(self.orb_detector.detect(image)),
            Detector::Brisk | Detector::Akaze | Detector::Sift => Err(Unsupported::Detector {
                backend: BACKEND_NAME,
                detector,
            }
            .into()),
        }
    }

    fn describe(
        &mut self,
        image: &GrayImage,
        keypoints: &mut Vec<KeyPoint>,
        descriptor: Descriptor,
    ) -> Result<Vec<BinaryDescriptor>> {
        let descriptors = match descriptor {
            Descriptor::Brief => self.brief.describe(image, keypoints),
            Descriptor::Orb => self.orb_descriptor.describe(image, keypoints),
            Descriptor::Brisk | Descriptor::Freak | Descriptor::Akaze | Descriptor::Sift => {
                return Err(Unsupported::Descriptor {
                    backend: BACKEND_NAME,
                    descriptor,
                }
                .into());
            }
        };
        if descriptors.len() != keypoints.len() {
            return Err(FeatureError::Descriptor(format!(
                "{descriptor} produced {} rows for {} keypoints",
                descriptors.len(),
                keypoints.len()
            )));
        }
        Ok(descriptors)
    }

    fn match_nearest(
        &mut self,
        source: &Vec<BinaryDescriptor>,
        reference: &Vec<BinaryDescriptor>,
        matcher: MatcherKind,
        kind: DescriptorKind,
    ) -> Result<Vec<DMatch>> {
        Ok(Self::matcher_for(matcher, kind)?.nearest(source, reference))
    }

    fn match_knn(
        &mut self,
        source: &Vec<BinaryDescriptor>,
        reference: &Vec<BinaryDescriptor>,
        matcher: MatcherKind,
        kind: DescriptorKind,
        k: usize,
    ) -> Result<Vec<Vec<DMatch>>> {
        Ok(Self::matcher_for(matcher, kind)?.knn(source, reference, k))
    }
}
