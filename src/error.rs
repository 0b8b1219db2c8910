use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons why a single file could not be fingerprinted or have its features extracted.
///
/// These never escape the duplicate searches: the file is logged and skipped. They are public
/// so that custom [`crate::FeatureExtractor`]s and callers of the lower level functions can use them.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    /// The file could not be read.
    #[error("Io error at {src_path}: {error}")]
    Io { src_path: PathBuf, error: String },

    /// File is not a video.
    #[error("File is not a video")]
    NotVideo,

    /// The video has no frames, or a non-positive duration.
    #[error("Could not sample any frames")]
    NoFrames,

    #[error("Video processing error: {0}")]
    VidProc(String),

    /// Externally supplied features are malformed.
    #[error("Invalid video features: {0}")]
    InvalidFeatures(String),
}

impl Error {
    pub(crate) fn io(src_path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::Io {
            src_path: src_path.into(),
            error: error.to_string(),
        }
    }
}
