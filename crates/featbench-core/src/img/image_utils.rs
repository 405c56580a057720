use image::{GenericImageView, Luma};

pub fn bilinear_sample_luma<T, I>(img: &I, x: f32, y: f32) -> f32
where
    I: GenericImageView<Pixel = Luma<T>>,
    T: image::Primitive + Into<f32>,
{
    if x < 0.0 || y < 0.0 {
        return 0.0;
    }
    let w = img.width() as f32;
    let h = img.height() as f32;
    if x > w - 1.0 || y > h - 1.0 {
        return 0.0;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);

    let dx = x - x0 as f32;
    let dy = y - y0 as f32;

    let p00: f32 = img.get_pixel(x0, y0).0[0].into();
    let p10: f32 = img.get_pixel(x1, y0).0[0].into();
    let p01: f32 = img.get_pixel(x0, y1).0[0].into();
    let p11: f32 = img.get_pixel(x1, y1).0[0].into();

    let top = p00 + dx * (p10 - p00);
    let bot = p01 + dx * (p11 - p01);
    top + dy * (bot - top)
}

/// Orientation in radians of the intensity centroid of the disc of `radius`
/// around `(cx, cy)`.
pub fn intensity_centroid_angle<I>(img: &I, cx: f32, cy: f32, radius: f32) -> f32
where
    I: GenericImageView<Pixel = Luma<u8>>,
{
    let r = radius.round() as i32;
    let r2 = r * r;
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let intensity = bilinear_sample_luma(img, cx + dx as f32, cy + dy as f32);
            m10 += dx as f32 * intensity;
            m01 += dy as f32 * intensity;
        }
    }

    if m10.abs() < f32::EPSILON && m01.abs() < f32::EPSILON {
        0.0
    } else {
        m01.atan2(m10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::GrayImage;

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let img = GrayImage::from_fn(4, 4, |x, _| Luma([(x * 10) as u8]));
        assert_relative_eq!(bilinear_sample_luma(&img, 1.5, 2.0), 15.0);
        assert_relative_eq!(bilinear_sample_luma(&img, -0.5, 2.0), 0.0);
    }

    #[test]
    fn centroid_points_towards_bright_side() {
        // brighter to the right => angle ~ 0; brighter below => angle ~ pi/2
        let right = GrayImage::from_fn(41, 41, |x, _| Luma([(x * 5) as u8]));
        let down = GrayImage::from_fn(41, 41, |_, y| Luma([(y * 5) as u8]));
        assert_relative_eq!(intensity_centroid_angle(&right, 20.0, 20.0, 15.0), 0.0, epsilon = 1e-3);
        assert_relative_eq!(
            intensity_centroid_angle(&down, 20.0, 20.0, 15.0),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-3
        );
    }
}
