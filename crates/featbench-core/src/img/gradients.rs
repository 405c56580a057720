use image::{GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

pub type GradientImage = ImageBuffer<Luma<i16>, Vec<i16>>;

/// 3x3 Sobel derivatives of a grayscale image.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub grad_x: GradientImage,
    pub grad_y: GradientImage,
}

impl Gradients {
    pub fn new(image: &GrayImage) -> Self {
        Self {
            grad_x: horizontal_sobel(image),
            grad_y: vertical_sobel(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.grad_x.width()
    }

    pub fn height(&self) -> u32 {
        self.grad_x.height()
    }

    /// Structure tensor `(ixx, iyy, ixy)` summed over a `block_size` square
    /// anchored like a box filter, i.e. starting at `x - block_size / 2`.
    /// `None` when the window leaves the image.
    pub fn structure_tensor(&self, x: u32, y: u32, block_size: u32) -> Option<(f32, f32, f32)> {
        let block = block_size.max(1) as i64;
        let lo = -(block / 2);
        let hi = lo + block - 1;
        let (x, y) = (x as i64, y as i64);
        if x + lo < 0
            || y + lo < 0
            || x + hi >= self.width() as i64
            || y + hi >= self.height() as i64
        {
            return None;
        }

        let mut ixx = 0.0f32;
        let mut iyy = 0.0f32;
        let mut ixy = 0.0f32;
        for wy in (y + lo)..=(y + hi) {
            for wx in (x + lo)..=(x + hi) {
                let gx = self.grad_x.get_pixel(wx as u32, wy as u32)[0] as f32;
                let gy = self.grad_y.get_pixel(wx as u32, wy as u32)[0] as f32;
                ixx += gx * gx;
                iyy += gy * gy;
                ixy += gx * gy;
            }
        }
        Some((ixx, iyy, ixy))
    }

    /// Evaluates `response(ixx, iyy, ixy)` at every pixel, row-major. Pixels
    /// whose window leaves the image score 0.
    pub fn response_map<F>(&self, block_size: u32, response: F) -> Vec<f32>
    where
        F: Fn(f32, f32, f32) -> f32,
    {
        let (width, height) = (self.width(), self.height());
        let mut map = vec![0.0f32; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                if let Some((ixx, iyy, ixy)) = self.structure_tensor(x, y, block_size) {
                    map[(y * width + x) as usize] = response(ixx, iyy, ixy);
                }
            }
        }
        map
    }
}

/// Smallest eigenvalue of the structure tensor (Shi-Tomasi score).
pub fn min_eigenvalue(ixx: f32, iyy: f32, ixy: f32) -> f32 {
    let half_trace = 0.5 * (ixx + iyy);
    let half_diff = 0.5 * (ixx - iyy);
    half_trace - (half_diff * half_diff + ixy * ixy).sqrt()
}

/// Harris corner measure `det(M) - k * trace(M)^2`.
pub fn harris_response(ixx: f32, iyy: f32, ixy: f32, k: f32) -> f32 {
    let trace = ixx + iyy;
    ixx * iyy - ixy * ixy - k * trace * trace
}
