pub mod config;
pub mod sequence;

pub use config::*;
pub use sequence::*;
