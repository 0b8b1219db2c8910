#![warn(clippy::unwrap_used)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

//! Thin wrappers around the `ffprobe` and `ffmpeg` command line tools.
//!
//! * [`VideoInfo`] reads duration, resolution, frame rate and frame count.
//! * [`read_frame_at`] decodes a single RGB frame at a timestamp.
//!
//! Both tools must be installed and visible on the `PATH`.

mod ffmpeg_error_kind;
mod ffmpeg_ops;
mod ffmpeg_stats;

pub use ffmpeg_error_kind::FfmpegError;
pub use ffmpeg_ops::{
    ffmpeg_and_ffprobe_are_callable, get_video_stats, read_frame_at, DEFAULT_FFMPEG_TIMEOUT,
};
pub use ffmpeg_stats::{VideoInfo, VideoInfoError};
