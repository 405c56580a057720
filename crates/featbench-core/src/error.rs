use thiserror::Error;

use crate::backend::Unsupported;

/// Failures raised while running a feature backend.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("failed to load image '{path}': {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Unsupported(#[from] Unsupported),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("Matching error: {0}")]
    Matching(String),
}

pub type Result<T> = std::result::Result<T, FeatureError>;
