use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Search directory does not exist or is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("--features requires ffmpeg and ffprobe to be installed and on the PATH")]
    #[allow(dead_code)] // unused when the ffmpeg backend is not compiled
    FfmpegNotCallable,

    #[error("--features is unavailable: this binary was built without the ffmpeg backend")]
    #[allow(dead_code)] // unused when the ffmpeg backend is compiled
    NoFeatureBackend,

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
