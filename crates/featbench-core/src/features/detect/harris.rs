use image::GrayImage;
use log::{debug, trace};

use crate::img::Gradients;
use crate::img::gradients::harris_response;
use crate::keypoint::KeyPoint;

#[derive(Debug, Clone, Copy)]
pub struct HarrisConfig {
    pub block_size: u32,
    /// Sobel aperture; only sets the reported keypoint size.
    pub aperture_size: u32,
    pub k: f32,
    /// Threshold on the response after normalising to 0..255.
    pub min_response: f32,
}

impl Default for HarrisConfig {
    fn default() -> Self {
        Self {
            block_size: 2,
            aperture_size: 3,
            k: 0.04,
            min_response: 100.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarrisDetector {
    config: HarrisConfig,
}

impl HarrisDetector {
    pub fn new(config: HarrisConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, image: &GrayImage) -> Vec<KeyPoint> {
        let (width, height) = image.dimensions();
        let k = self.config.k;
        let gradients = Gradients::new(image);
        let response = gradients.response_map(self.config.block_size, |ixx, iyy, ixy| {
            harris_response(ixx, iyy, ixy, k)
        });

        let (min, max) = response
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;
        if !range.is_finite() || range <= f32::EPSILON {
            trace!("Harris: flat response map");
            return Vec::new();
        }

        let size = 2.0 * self.config.aperture_size as f32;
        let mut candidates = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let normalized = ((response[(y * width + x) as usize] - min) / range * 255.0).floor();
                if normalized > self.config.min_response {
                    candidates.push(KeyPoint::new(x as f32, y as f32, size).with_response(normalized));
                }
            }
        }
        trace!("Harris: {} pixels above {}", candidates.len(), self.config.min_response);

        let keypoints = suppress_overlaps(candidates);

        debug!("Harris in {}x{} → {} keypoints", width, height, keypoints.len());
        keypoints
    }
}

/// Overlap suppression over candidates in raster order. A candidate that
/// overlaps a kept keypoint replaces the first overlapped one it is stronger
/// than; if it overlaps only stronger (or equal) keypoints it is dropped.
/// Kept keypoints may end up overlapping after a replacement.
pub fn suppress_overlaps<I>(candidates: I) -> Vec<KeyPoint>
where
    I: IntoIterator<Item = KeyPoint>,
{
    let mut kept: Vec<KeyPoint> = Vec::new();
    for candidate in candidates {
        let mut overlapped = false;
        for existing in kept.iter_mut() {
            if candidate.overlaps(existing) {
                overlapped = true;
                if candidate.response > existing.response {
                    *existing = candidate;
                    break;
                }
            }
        }
        if !overlapped {
            kept.push(candidate);
        }
    }
    kept
}
