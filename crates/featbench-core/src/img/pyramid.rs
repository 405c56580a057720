use image::GrayImage;
use image::imageops::{FilterType, resize};
use log::{debug, trace};

#[derive(Debug, Clone)]
pub struct PyramidLevel {
    pub level: usize,
    /// Multiply level coordinates by this to get full-resolution coordinates.
    pub scale: f32,
    pub image: GrayImage,
}

impl PyramidLevel {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Image pyramid where level `l` is the base downscaled by `scale_factor^l`.
#[derive(Debug, Clone)]
pub struct Pyramid {
    levels: Vec<PyramidLevel>,
}

impl Pyramid {
    /// Builds up to `levels` levels, stopping early once a level would be
    /// narrower or shorter than `min_side` pixels.
    pub fn build(base: &GrayImage, levels: usize, scale_factor: f32, min_side: u32) -> Pyramid {
        assert!(levels >= 1, "Pyramid must contain at least one level.");
        assert!(scale_factor > 1.0, "Pyramid scale factor must exceed 1.");

        debug!(
            "Building pyramid with {} levels (x{:.2}) from {}x{} image",
            levels,
            scale_factor,
            base.width(),
            base.height()
        );

        let mut out = Vec::with_capacity(levels);
        out.push(PyramidLevel {
            level: 0,
            scale: 1.0,
            image: base.clone(),
        });

        for level in 1..levels {
            let scale = scale_factor.powi(level as i32);
            let width = (base.width() as f32 / scale).round() as u32;
            let height = (base.height() as f32 / scale).round() as u32;
            if width < min_side.max(2) || height < min_side.max(2) {
                trace!("Pyramid stops at level {level} ({width}x{height})");
                break;
            }
            out.push(PyramidLevel {
                level,
                scale,
                image: resize(base, width, height, FilterType::Triangle),
            });
        }

        Pyramid { levels: out }
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&PyramidLevel> {
        self.levels.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn levels_shrink_by_scale_factor() {
        let base = GrayImage::new(120, 60);
        let pyramid = Pyramid::build(&base, 4, 1.2, 8);
        assert_eq!(pyramid.levels().len(), 4);
        assert_eq!(pyramid.level(1).unwrap().width(), 100);
        assert_eq!(pyramid.level(1).unwrap().height(), 50);
        assert_relative_eq!(pyramid.level(3).unwrap().scale, 1.728, epsilon = 1e-5);
    }

    #[test]
    fn stops_before_levels_get_too_small() {
        let base = GrayImage::new(64, 64);
        let pyramid = Pyramid::build(&base, 8, 2.0, 10);
        // 64, 32, 16, then 8 < 10
        assert_eq!(pyramid.levels().len(), 3);
    }
}
