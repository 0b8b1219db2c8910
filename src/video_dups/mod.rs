pub mod content_hash;
pub mod feature_extractor;
pub(crate) mod file_discovery;
pub mod frame_features;
pub(crate) mod group_merge;
pub mod matches;
pub(crate) mod size_buckets;
pub mod video_dup_finder;
pub mod video_features;
