use image::GrayImage;
use log::{debug, trace};

use crate::keypoint::KeyPoint;

/// Bresenham circle of radius 3, clockwise from the top.
const CIRCLE_OFFSETS: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const CIRCLE_RADIUS: u32 = 3;

/// Diameter reported for FAST keypoints.
pub const FAST_KEYPOINT_SIZE: f32 = 7.0;

/// Contiguous circle pixels that must all be brighter or all darker (9 of 16).
const ARC_LENGTH: usize = 9;

#[derive(Debug, Clone, Copy)]
pub struct FastConfig {
    pub threshold: f32,
    pub nonmax_suppression: bool,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            threshold: 30.0,
            nonmax_suppression: true,
        }
    }
}

/// A pixel that passed the segment test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct FastDetector {
    config: FastConfig,
}

impl FastDetector {
    pub fn new(config: FastConfig) -> Self {
        let mut config = config;
        config.threshold = config.threshold.max(0.0);
        trace!(
            "FAST config: threshold {:.1}, nonmax {}",
            config.threshold, config.nonmax_suppression
        );

        Self { config }
    }

    /// Runs the segment test on every pixel at least `border` pixels away
    /// from the image edge.
    pub fn corners(&self, image: &GrayImage, border: u32) -> Vec<Corner> {
        let (width, height) = image.dimensions();
        let border = border.max(CIRCLE_RADIUS);
        if width <= border * 2 || height <= border * 2 {
            return Vec::new();
        }

        let mut score_map = vec![0.0f32; (width * height) as usize];
        let mut candidates = Vec::new();
        for y in border..height - border {
            for x in border..width - border {
                if let Some(score) =
                    corner_score(image, x, y, self.config.threshold)
                {
                    score_map[(y * width + x) as usize] = score;
                    candidates.push(Corner { x, y, score });
                }
            }
        }

        trace!(
            "FAST found {} raw corners above threshold {:.1}",
            candidates.len(),
            self.config.threshold
        );

        if self.config.nonmax_suppression {
            apply_nonmax_suppression(&candidates, &score_map, width, height)
        } else {
            candidates
        }
    }

    pub fn detect(&self, image: &GrayImage) -> Vec<KeyPoint> {
        let keypoints: Vec<KeyPoint> = self
            .corners(image, CIRCLE_RADIUS)
            .into_iter()
            .map(|c| KeyPoint::new(c.x as f32, c.y as f32, FAST_KEYPOINT_SIZE).with_response(c.score))
            .collect();

        debug!(
            "FAST in {}x{} → {} keypoints",
            image.width(),
            image.height(),
            keypoints.len()
        );
        keypoints
    }
}

/// Sum of absolute differences along the longest qualifying arc, or `None`
/// when the pixel is not a corner.
fn corner_score(image: &GrayImage, x: u32, y: u32, threshold: f32) -> Option<f32> {
    let sample = |(dx, dy): (i32, i32)| {
        image.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as f32
    };
    let center = image.get_pixel(x, y)[0] as f32;
    let high = center + threshold;
    let low = center - threshold;

    // a 9-pixel arc always covers two of the four compass points
    let needed = ARC_LENGTH / 4;
    let mut brighter = 0;
    let mut darker = 0;
    for idx in [0usize, 4, 8, 12] {
        let value = sample(CIRCLE_OFFSETS[idx]);
        if value > high {
            brighter += 1;
        } else if value < low {
            darker += 1;
        }
    }
    if brighter < needed && darker < needed {
        return None;
    }

    let mut values = [0.0f32; 16];
    let mut classes = [0i8; 16];
    for (i, &offset) in CIRCLE_OFFSETS.iter().enumerate() {
        let value = sample(offset);
        values[i] = value;
        classes[i] = if value > high {
            1
        } else if value < low {
            -1
        } else {
            0
        };
    }

    let mut best: Option<f32> = None;
    for sign in [1i8, -1i8] {
        let mut run = 0usize;
        let mut sum = 0.0f32;
        // walk the circle twice so arcs may wrap around index 0
        for i in 0..32 {
            let c = i % 16;
            if classes[c] != sign {
                run = 0;
                sum = 0.0;
                continue;
            }
            if run == 16 {
                break;
            }
            run += 1;
            sum += (values[c] - center).abs();
            if run >= ARC_LENGTH {
                best = Some(best.map_or(sum, |b: f32| b.max(sum)));
            }
        }
    }
    best
}

fn apply_nonmax_suppression(
    candidates: &[Corner],
    score_map: &[f32],
    width: u32,
    height: u32,
) -> Vec<Corner> {
    let mut filtered = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Corner { x, y, score } = *candidate;
        let x_min = x.saturating_sub(1);
        let x_max = (x + 1).min(width - 1);
        let y_min = y.saturating_sub(1);
        let y_max = (y + 1).min(height - 1);

        let mut is_max = true;
        'scan: for ny in y_min..=y_max {
            for nx in x_min..=x_max {
                if nx == x && ny == y {
                    continue;
                }
                if score_map[(ny * width + nx) as usize] > score {
                    is_max = false;
                    break 'scan;
                }
            }
        }

        if is_max {
            filtered.push(*candidate);
        }
    }
    filtered
}
