pub mod backend;
pub mod buffer;
pub mod combination;
pub mod error;
pub mod features;
pub mod img;
pub mod keypoint;
pub mod matching;
pub mod params;
pub mod roi;

pub use backend::{FeatureBackend, Unsupported};
pub use buffer::{DATA_BUFFER_SIZE, Frame, FrameBuffer};
pub use combination::{
    Combination, CombinationRecord, FrameMetrics, FrameSample, Incompatibility, MetricsSummary,
    RejectReason, Sweep,
};
pub use error::{FeatureError, Result};
pub use features::NativeBackend;
pub use keypoint::{DMatch, KeyPoint};
pub use matching::{LOWE_RATIO, ratio_test, select_matches};
pub use params::{Descriptor, DescriptorKind, Detector, MatcherKind, ParamError, SelectorKind};
pub use roi::Roi;
