pub mod fast;
pub mod harris;
pub mod nms;
pub mod orb;
pub mod shi_tomasi;

pub use fast::{FastConfig, FastDetector};
pub use harris::{HarrisConfig, HarrisDetector, suppress_overlaps};
pub use orb::{OrbConfig, OrbDetector};
pub use shi_tomasi::{ShiTomasiConfig, ShiTomasiDetector};
