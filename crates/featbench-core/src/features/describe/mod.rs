pub mod brief;
pub mod orb;
pub mod pattern;

pub use brief::BriefDescriptor;
pub use orb::{OrbDescriptor, OrbDescriptorConfig};
pub use pattern::{BinaryDescriptor, DESCRIPTOR_BYTES};
