#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::panic)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! vid_dup_engine is a library for finding exact and near-identical duplicate video files in a
//! directory tree.
//!
//! # How it works
//! Videos are compared in stages, so that the expensive stages only run on likely duplicates:
//! * Files are found by extension and grouped by their exact size in bytes. Files with a size that
//!   no other file shares cannot be duplicates and are dropped.
//! * Each group of same-sized files is hashed. Files with equal hashes are byte-identical duplicates.
//! * Optionally, a handful of frames are sampled from each video and summarized as colour
//!   histograms and edge/colour descriptors. Groups of same-sized files whose frames look alike
//!   are merged, which finds copies that differ in a few bytes (e.g. remuxed metadata).
//!
//! # High Level API
//! ```rust,no_run
//! use vid_dup_engine::{find_duplicate_videos, ScanHooks, SearchOptions};
//!
//! let mut hooks = ScanHooks::new().on_progress(|pct| println!("{pct}%"));
//! let groups = find_duplicate_videos("/home/me/videos", &SearchOptions::default(), &mut hooks);
//!
//! for group in groups {
//!     println!("{} bytes, {}", group.size(), group.digest());
//!     for path in group.files() {
//!         println!("    {}", path.display());
//!     }
//! }
//! ```
//!
//! Near-duplicates are found with [`find_duplicate_videos_with_features`], given a
//! [`FeatureExtractor`]. With the default `ffmpeg_backend` feature, [`FfmpegFeatureExtractor`]
//! decodes frames with the command line tools `ffmpeg` and `ffprobe`, which must be installed and
//! visible on the `PATH`. Any closure `Fn(&Path) -> Option<VideoFeatures>` may be used instead.
//!
//! # Progress and cancellation
//! Searches run on the caller's thread. Progress and cancellation are polled through
//! [`ScanHooks`]. Stopping a search is not an error: the groups found so far are returned.
//!
//! # Limitations
//! Only files of exactly the same size are ever compared, so re-encoded copies (which almost always
//! change size) are not found.

mod definitions;
mod error;
mod scan_hooks;
mod video_dups;

pub use definitions::{
    DEFAULT_MIN_FEATURE_FILE_SIZE, DEFAULT_SAMPLE_COUNT, DEFAULT_SIMILARITY_THRESHOLD,
    DEFAULT_VIDEO_EXTENSIONS,
};
pub use error::Error;
pub use scan_hooks::ScanHooks;
pub use video_dups::{
    content_hash::{hash_file, ContentDigest},
    feature_extractor::{sample_positions, ExtractionOptions, FeatureExtractor},
    frame_features::frame_sample,
    matches::duplicate_group::{DuplicateGroup, TooFewEntries},
    video_dup_finder::{find_duplicate_videos, find_duplicate_videos_with_features, SearchOptions},
    video_features::{FrameSample, VideoFeatures, VideoMetadata},
};

#[cfg(feature = "ffmpeg_backend")]
pub use video_dups::feature_extractor::FfmpegFeatureExtractor;
