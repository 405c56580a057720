use image::GrayImage;
use log::{debug, trace};

use super::fast::{FastConfig, FastDetector};
use crate::img::gradients::harris_response;
use crate::img::{Gradients, Pyramid, intensity_centroid_angle};
use crate::keypoint::KeyPoint;

#[derive(Debug, Clone, Copy)]
pub struct OrbConfig {
    pub max_features: usize,
    pub scale_factor: f32,
    pub levels: usize,
    pub edge_threshold: u32,
    pub fast_threshold: f32,
    pub patch_size: u32,
    pub harris_block_size: u32,
    pub harris_k: f32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            scale_factor: 1.2,
            levels: 8,
            edge_threshold: 31,
            fast_threshold: 20.0,
            patch_size: 31,
            harris_block_size: 7,
            harris_k: 0.04,
        }
    }
}

/// Oriented FAST over a scale pyramid, ranked by Harris score.
#[derive(Debug, Clone)]
pub struct OrbDetector {
    config: OrbConfig,
    fast: FastDetector,
}

impl OrbDetector {
    pub fn new(config: OrbConfig) -> Self {
        let fast = FastDetector::new(FastConfig {
            threshold: config.fast_threshold,
            nonmax_suppression: true,
        });
        Self { config, fast }
    }

    pub fn detect(&self, image: &GrayImage) -> Vec<KeyPoint> {
        let cfg = &self.config;
        let pyramid = Pyramid::build(image, cfg.levels.max(1), cfg.scale_factor, 2 * cfg.edge_threshold + 1);
        let quotas = features_per_level(cfg.max_features, cfg.scale_factor, pyramid.levels().len());
        let radius = (cfg.patch_size / 2) as f32;

        let mut keypoints = Vec::with_capacity(cfg.max_features);
        for (level, quota) in pyramid.levels().iter().zip(quotas) {
            if quota == 0 {
                continue;
            }
            let gradients = Gradients::new(&level.image);
            let mut scored: Vec<(u32, u32, f32)> = self
                .fast
                .corners(&level.image, cfg.edge_threshold)
                .into_iter()
                .filter_map(|c| {
                    let (ixx, iyy, ixy) = gradients.structure_tensor(c.x, c.y, cfg.harris_block_size)?;
                    Some((c.x, c.y, harris_response(ixx, iyy, ixy, cfg.harris_k)))
                })
                .collect();
            scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(quota);

            trace!(
                "ORB level {} ({}x{}): keeping {} of quota {}",
                level.level,
                level.width(),
                level.height(),
                scored.len(),
                quota
            );

            for (x, y, response) in scored {
                let angle = intensity_centroid_angle(&level.image, x as f32, y as f32, radius)
                    .to_degrees()
                    .rem_euclid(360.0);
                keypoints.push(KeyPoint {
                    position: nalgebra::Vector2::new(x as f32 * level.scale, y as f32 * level.scale),
                    size: cfg.patch_size as f32 * level.scale,
                    angle: Some(angle),
                    response,
                    octave: level.level as i32,
                    class_id: -1,
                });
            }
        }

        debug!(
            "ORB over {} levels → {} keypoints",
            pyramid.levels().len(),
            keypoints.len()
        );
        keypoints
    }
}

/// Splits `total` features across `levels` geometrically so that each level
/// gets `1 / scale_factor` of the previous one's share. The last level takes
/// the remainder.
pub fn features_per_level(total: usize, scale_factor: f32, levels: usize) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let factor = 1.0 / scale_factor as f64;
    let mut per_scale = if levels == 1 {
        total as f64
    } else {
        total as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32))
    };

    let mut quotas = Vec::with_capacity(levels);
    let mut assigned = 0usize;
    for _ in 0..levels - 1 {
        let quota = (per_scale.round() as usize).min(total - assigned);
        assigned += quota;
        quotas.push(quota);
        per_scale *= factor;
    }
    quotas.push(total - assigned);
    quotas
}
