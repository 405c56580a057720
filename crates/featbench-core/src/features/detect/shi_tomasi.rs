use image::GrayImage;
use log::{debug, trace};

use super::nms::{sort_by_response, suppress_neighbours};
use crate::img::Gradients;
use crate::img::gradients::min_eigenvalue;
use crate::keypoint::KeyPoint;

#[derive(Debug, Clone, Copy)]
pub struct ShiTomasiConfig {
    pub block_size: u32,
    /// Fraction of the strongest response a corner must exceed.
    pub quality_level: f32,
    pub min_distance: f32,
    /// Defaults to one corner per `min_distance` pixels of image area.
    pub max_corners: Option<usize>,
}

impl Default for ShiTomasiConfig {
    fn default() -> Self {
        // no overlap between neighbouring 4x4 blocks
        Self {
            block_size: 4,
            quality_level: 0.01,
            min_distance: 4.0,
            max_corners: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShiTomasiDetector {
    config: ShiTomasiConfig,
}

impl ShiTomasiDetector {
    pub fn new(config: ShiTomasiConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, image: &GrayImage) -> Vec<KeyPoint> {
        let (width, height) = image.dimensions();
        if width < 3 || height < 3 {
            return Vec::new();
        }

        let gradients = Gradients::new(image);
        let response = gradients.response_map(self.config.block_size, min_eigenvalue);
        let max_response = response.iter().copied().fold(0.0f32, f32::max);
        if max_response <= 0.0 {
            trace!("Shi-Tomasi: no positive eigenvalue response");
            return Vec::new();
        }
        let threshold = self.config.quality_level * max_response;

        let mut candidates = local_maxima(&response, width, height, threshold, self.config.block_size as f32);
        trace!(
            "Shi-Tomasi: {} local maxima above {:.2}",
            candidates.len(),
            threshold
        );

        let max_corners = self.config.max_corners.unwrap_or_else(|| {
            let area = (width as f32 * height as f32) / self.config.min_distance.max(1.0);
            area as usize
        });
        sort_by_response(&mut candidates);
        let keypoints = suppress_neighbours(candidates, self.config.min_distance, max_corners);

        debug!(
            "Shi-Tomasi in {}x{} → {} keypoints",
            width,
            height,
            keypoints.len()
        );
        keypoints
    }
}

/// Pixels strictly above `threshold` that are not exceeded by any of their
/// eight neighbours.
pub(super) fn local_maxima(response: &[f32], width: u32, height: u32, threshold: f32, size: f32) -> Vec<KeyPoint> {
    let at = |x: u32, y: u32| response[(y * width + x) as usize];
    let mut out = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let value = at(x, y);
            if value <= threshold {
                continue;
            }
            let dominated = (y - 1..=y + 1)
                .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (nx, ny)))
                .any(|(nx, ny)| at(nx, ny) > value);
            if !dominated {
                out.push(KeyPoint::new(x as f32, y as f32, size).with_response(value));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn squares() -> GrayImage {
        GrayImage::from_fn(64, 48, |x, y| {
            let in_a = (10..26).contains(&x) && (10..26).contains(&y);
            let in_b = (38..54).contains(&x) && (20..36).contains(&y);
            if in_a || in_b { Luma([230]) } else { Luma([20]) }
        })
    }

    #[test]
    fn detects_square_corners() {
        let keypoints = ShiTomasiDetector::new(ShiTomasiConfig::default()).detect(&squares());
        assert!(keypoints.len() >= 8);
        for (cx, cy) in [(10.0, 10.0), (25.0, 25.0), (38.0, 20.0), (53.0, 35.0)] {
            assert!(
                keypoints
                    .iter()
                    .any(|k| (k.x() - cx).abs() <= 3.0 && (k.y() - cy).abs() <= 3.0),
                "no corner near ({cx}, {cy})"
            );
        }
        assert!(keypoints.iter().all(|k| k.size == 4.0));
    }

    #[test]
    fn keypoints_keep_min_distance() {
        let keypoints = ShiTomasiDetector::new(ShiTomasiConfig::default()).detect(&squares());
        for (i, a) in keypoints.iter().enumerate() {
            for b in &keypoints[i + 1..] {
                assert!((a.position - b.position).norm() >= 4.0);
            }
        }
    }

    #[test]
    fn max_corners_caps_output() {
        let detector = ShiTomasiDetector::new(ShiTomasiConfig {
            max_corners: Some(3),
            ..ShiTomasiConfig::default()
        });
        assert_eq!(detector.detect(&squares()).len(), 3);
    }

    #[test]
    fn uniform_image_is_empty() {
        let image = GrayImage::from_pixel(32, 32, Luma([90]));
        assert!(ShiTomasiDetector::new(ShiTomasiConfig::default()).detect(&image).is_empty());
    }
}
