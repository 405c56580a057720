use nalgebra::Vector2;

/// A detected salient image location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPoint {
    /// Pixel position in the full-resolution image.
    pub position: Vector2<f32>,
    /// Diameter of the meaningful neighbourhood.
    pub size: f32,
    /// Dominant orientation in degrees, when the detector computes one.
    pub angle: Option<f32>,
    pub response: f32,
    /// Pyramid level (or the backend's packed octave).
    pub octave: i32,
    /// Backend-specific tag, -1 when unused.
    pub class_id: i32,
}

impl KeyPoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            position: Vector2::new(x, y),
            size,
            angle: None,
            response: 0.0,
            octave: 0,
            class_id: -1,
        }
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// True when the two keypoint discs intersect.
    pub fn overlaps(&self, other: &KeyPoint) -> bool {
        let reach = 0.5 * (self.size + other.size);
        (self.position - other.position).norm_squared() < reach * reach
    }
}

/// A correspondence between a source (query) and a reference (train) descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

impl DMatch {
    pub fn new(query_idx: usize, train_idx: usize, distance: f32) -> Self {
        Self {
            query_idx,
            train_idx,
            distance,
        }
    }
}

/// Keeps the `max_keep` strongest keypoints. Equal responses keep their order.
pub fn retain_best(keypoints: &mut Vec<KeyPoint>, max_keep: usize) {
    if keypoints.len() <= max_keep {
        return;
    }
    sort_by_response(keypoints);
    keypoints.truncate(max_keep);
}

/// Stable sort, strongest response first.
pub fn sort_by_response(keypoints: &mut [KeyPoint]) {
    keypoints.sort_by(|a, b| {
        b.response
            .partial_cmp(&a.response)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
