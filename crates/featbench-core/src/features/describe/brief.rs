use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use log::trace;

use super::pattern::{BRIEF_HALF_EXTENT, BinaryDescriptor, DESCRIPTOR_BYTES, set_bit, square_pattern};
use crate::keypoint::KeyPoint;

/// Unrotated binary tests on a smoothed full-resolution image.
#[derive(Debug, Clone)]
pub struct BriefDescriptor {
    blur_sigma: f32,
}

impl Default for BriefDescriptor {
    fn default() -> Self {
        Self { blur_sigma: 2.0 }
    }
}

impl BriefDescriptor {
    pub fn border() -> u32 {
        BRIEF_HALF_EXTENT as u32 + 8
    }

    pub fn describe(&self, image: &GrayImage, keypoints: &mut Vec<KeyPoint>) -> Vec<BinaryDescriptor> {
        let smoothed = gaussian_blur_f32(image, self.blur_sigma);
        let border = Self::border() as i64;
        let (width, height) = (image.width() as i64, image.height() as i64);
        let pattern = square_pattern();

        let before = keypoints.len();
        let mut descriptors = Vec::with_capacity(before);
        keypoints.retain(|kp| {
            let cx = kp.x().round() as i64;
            let cy = kp.y().round() as i64;
            if cx < border || cy < border || cx >= width - border || cy >= height - border {
                return false;
            }

            let sample = |(dx, dy): (f32, f32)| {
                smoothed.get_pixel((cx + dx as i64) as u32, (cy + dy as i64) as u32)[0]
            };
            let mut bytes = [0u8; DESCRIPTOR_BYTES];
            for (i, pair) in pattern.iter().enumerate() {
                if sample(pair.p1) < sample(pair.p2) {
                    set_bit(&mut bytes, i);
                }
            }
            descriptors.push(bytes);
            true
        });

        trace!("BRIEF described {} of {} keypoints", keypoints.len(), before);
        descriptors
    }
}
