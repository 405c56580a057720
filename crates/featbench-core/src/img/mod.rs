pub mod gradients;
pub mod image_utils;
pub mod pyramid;

pub use gradients::Gradients;
pub use image::GrayImage;
pub use image_utils::{bilinear_sample_luma, intensity_centroid_angle};
pub use pyramid::{Pyramid, PyramidLevel};
