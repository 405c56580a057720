use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use log::trace;

use super::pattern::{BinaryDescriptor, DESCRIPTOR_BYTES, ORB_PATCH_RADIUS, TestPair, disc_pattern, set_bit};
use crate::img::{Pyramid, bilinear_sample_luma, intensity_centroid_angle};
use crate::keypoint::KeyPoint;

#[derive(Debug, Clone, Copy)]
pub struct OrbDescriptorConfig {
    pub levels: usize,
    pub scale_factor: f32,
    pub blur_sigma: f32,
}

impl Default for OrbDescriptorConfig {
    fn default() -> Self {
        Self {
            levels: 8,
            scale_factor: 1.2,
            blur_sigma: 2.0,
        }
    }
}

/// Rotated BRIEF over a smoothed pyramid level.
///
/// Each keypoint is described on the level given by its octave. Keypoints
/// without an orientation get one from the intensity centroid of the patch
/// first, so the descriptor is rotation invariant either way.
#[derive(Debug, Clone, Default)]
pub struct OrbDescriptor {
    config: OrbDescriptorConfig,
}

impl OrbDescriptor {
    pub fn new(config: OrbDescriptorConfig) -> Self {
        Self { config }
    }

    /// Rotated patch corners reach `radius * sqrt(2)`, plus one pixel for the
    /// bilinear footprint.
    pub fn border() -> f32 {
        (ORB_PATCH_RADIUS * std::f32::consts::SQRT_2).ceil() + 1.0
    }

    pub fn describe(&self, image: &GrayImage, keypoints: &mut Vec<KeyPoint>) -> Vec<BinaryDescriptor> {
        let deepest = keypoints.iter().map(|k| k.octave.max(0) as usize).max().unwrap_or(0);
        let levels = (deepest + 1).min(self.config.levels.max(1));
        let pyramid = Pyramid::build(image, levels, self.config.scale_factor, 1);
        let smoothed: Vec<GrayImage> = pyramid
            .levels()
            .iter()
            .map(|level| gaussian_blur_f32(&level.image, self.config.blur_sigma))
            .collect();

        let border = Self::border();
        let pattern = disc_pattern();
        let mut kept = Vec::with_capacity(keypoints.len());
        let mut descriptors = Vec::with_capacity(keypoints.len());
        for kp in keypoints.drain(..) {
            let octave = kp.octave.max(0) as usize;
            let (Some(level), Some(blurred)) = (pyramid.level(octave), smoothed.get(octave)) else {
                continue;
            };
            let cx = kp.x() / level.scale;
            let cy = kp.y() / level.scale;
            if cx < border
                || cy < border
                || cx >= level.width() as f32 - border
                || cy >= level.height() as f32 - border
            {
                continue;
            }

            let angle_deg = kp.angle.unwrap_or_else(|| {
                intensity_centroid_angle(&level.image, cx, cy, ORB_PATCH_RADIUS)
                    .to_degrees()
                    .rem_euclid(360.0)
            });
            descriptors.push(rotated_tests(blurred, cx, cy, angle_deg.to_radians(), pattern));
            kept.push(KeyPoint {
                angle: Some(angle_deg),
                ..kp
            });
        }

        trace!(
            "ORB described {} keypoints over {} levels",
            kept.len(),
            pyramid.levels().len()
        );
        *keypoints = kept;
        descriptors
    }
}

fn rotated_tests(image: &GrayImage, cx: f32, cy: f32, angle: f32, pattern: &[TestPair]) -> BinaryDescriptor {
    let (sin_theta, cos_theta) = angle.sin_cos();
    let rotate = |(px, py): (f32, f32)| {
        (
            cos_theta * px - sin_theta * py + cx,
            sin_theta * px + cos_theta * py + cy,
        )
    };

    let mut bytes = [0u8; DESCRIPTOR_BYTES];
    for (i, pair) in pattern.iter().enumerate() {
        let (x1, y1) = rotate(pair.p1);
        let (x2, y2) = rotate(pair.p2);
        if bilinear_sample_luma(image, x1, y1) < bilinear_sample_luma(image, x2, y2) {
            set_bit(&mut bytes, i);
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn textured(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let (fx, fy) = (x as f32, y as f32);
            let v = 128.0 + 60.0 * (fx * 0.31).sin() + 50.0 * (fy * 0.23 + fx * 0.05).cos();
            Luma([v as u8])
        })
    }

    #[test]
    fn border_keypoints_are_dropped() {
        let image = textured(100, 80);
        let mut keypoints = vec![
            KeyPoint::new(5.0, 40.0, 31.0),
            KeyPoint::new(50.0, 40.0, 31.0),
            KeyPoint::new(50.0, 78.0, 31.0),
        ];
        let descriptors = OrbDescriptor::default().describe(&image, &mut keypoints);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(keypoints.len(), 1);
        assert_eq!(keypoints[0].x(), 50.0);
        assert!(keypoints[0].angle.is_some());
    }

    #[test]
    fn shifted_patches_produce_matching_descriptors() {
        let image = textured(120, 120);
        let mut shifted = GrayImage::new(120, 120);
        for (x, y, p) in shifted.enumerate_pixels_mut() {
            *p = if x >= 10 { *image.get_pixel(x - 10, y) } else { Luma([0]) };
        }

        let mut a = vec![KeyPoint::new(55.0, 60.0, 31.0)];
        let mut b = vec![KeyPoint::new(65.0, 60.0, 31.0)];
        let da = OrbDescriptor::default().describe(&image, &mut a);
        let db = OrbDescriptor::default().describe(&shifted, &mut b);
        assert_eq!(da.len(), 1);
        assert_eq!(db.len(), 1);
        let differing: u32 = da[0].iter().zip(&db[0]).map(|(x, y)| (x ^ y).count_ones()).sum();
        // interpolation rounding may flip a near-tie, nothing more
        assert!(differing <= 8, "{differing} bits differ");
    }

    #[test]
    fn octave_selects_pyramid_level() {
        let image = textured(160, 160);
        let mut keypoints = vec![KeyPoint {
            octave: 3,
            angle: Some(45.0),
            ..KeyPoint::new(80.0, 80.0, 31.0 * 1.728)
        }];
        let descriptors = OrbDescriptor::default().describe(&image, &mut keypoints);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(keypoints[0].angle, Some(45.0));
    }
}
