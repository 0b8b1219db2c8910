/// Extensions (without the leading dot) that are treated as videos when the caller does not
/// supply its own list. Matching is case-insensitive.
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 13] = [
    "mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "mpg", "mpeg", "mts", "m2ts",
];

/// The default similarity score at or above which two videos are considered near-duplicates.
/// A value of 1.0 only pairs videos whose sampled features are identical.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.95;

/// Files smaller than this are skipped by the feature-based search. It does not apply to the
/// hash-only search.
///
/// Unit: Bytes
pub const DEFAULT_MIN_FEATURE_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// The default number of frames sampled from each video by the feature extractor.
pub const DEFAULT_SAMPLE_COUNT: usize = 6;

// Files are hashed in chunks of this many bytes, so they never need to be held in memory.
pub const HASH_CHUNK_SIZE: usize = 4 * 1024 * 1024;

// Frame feature geometry. Histograms are HUE_BINS x SAT_BINS over the 8 bit HSV scale where
// hue lies in [0, 180) and saturation in [0, 256).
pub const HUE_BINS: usize = 8;
pub const SAT_BINS: usize = 8;
pub const HUE_RANGE: f32 = 180.0;
pub const SAT_RANGE: f32 = 256.0;
pub const HISTOGRAM_LEN: usize = HUE_BINS * SAT_BINS;

// Descriptors are an edge map and an RGB colour map, both downsampled to this size.
pub const DESCRIPTOR_X: u32 = 8;
pub const DESCRIPTOR_Y: u32 = 8;
pub const EDGE_MAP_LEN: usize = (DESCRIPTOR_X * DESCRIPTOR_Y) as usize;
pub const DESCRIPTOR_LEN: usize = EDGE_MAP_LEN * 4;

pub const CANNY_LOW_THRESHOLD: f32 = 100.0;
pub const CANNY_HIGH_THRESHOLD: f32 = 200.0;

// Similarity scoring.
pub const DURATION_GATE: f64 = 0.9;
pub const POSITION_WINDOW: f64 = 0.1;
pub const MAX_MERGE_SIZE_DIFF: f64 = 0.1;

pub const DURATION_WEIGHT: f64 = 0.1;
pub const RESOLUTION_WEIGHT: f64 = 0.1;
pub const HISTOGRAM_WEIGHT: f64 = 0.4;
pub const DESCRIPTOR_WEIGHT: f64 = 0.4;

// Progress milestones (percent) shared by both searches.
pub const PROGRESS_ENUMERATED: u8 = 5;
pub const PROGRESS_STATTED: u8 = 40;
pub const PROGRESS_PROCESSED: u8 = 99;
pub const PROGRESS_DONE: u8 = 100;
