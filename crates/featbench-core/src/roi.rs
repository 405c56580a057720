use serde::{Deserialize, Serialize};

use crate::keypoint::KeyPoint;

/// Axis-aligned pixel rectangle. The left and top edges are inside, the right
/// and bottom edges are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    /// Region covering the preceding vehicle in the KITTI sequence.
    pub const PRECEDING_VEHICLE: Roi = Roi::new(535, 180, 180, 150);

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (left, top) = (self.x as f32, self.y as f32);
        left <= x && x < left + self.width as f32 && top <= y && y < top + self.height as f32
    }

    /// Drops every keypoint outside the region, preserving order.
    pub fn retain(&self, keypoints: &mut Vec<KeyPoint>) {
        keypoints.retain(|kp| self.contains(kp.x(), kp.y()));
    }
}

impl Default for Roi {
    fn default() -> Self {
        Self::PRECEDING_VEHICLE
    }
}
