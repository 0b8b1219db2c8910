use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use super::{
    file_discovery::{enumerate_videos, stat_candidates},
    group_merge::merge_similar_groups,
    matches::duplicate_group::sort_groups,
    size_buckets::{bucket_by_size, bucketed_file_count},
};
use crate::{
    definitions::*, hash_file, ContentDigest, DuplicateGroup, FeatureExtractor, ScanHooks,
};

/// Options controlling which files are searched and how similar near-duplicates must be.
///
/// ```rust
/// use vid_dup_engine::SearchOptions;
///
/// let opts = SearchOptions::default()
///     .recursive(false)
///     .extensions([".MP4", "mkv"])
///     .similarity_threshold(0.9);
/// assert_eq!(opts.video_extensions(), ["mp4", "mkv"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    recursive: bool,
    extensions: Vec<String>,
    similarity_threshold: f64,
    min_feature_file_size: u64,
}

impl std::default::Default for SearchOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(ToString::to_string).collect(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_feature_file_size: DEFAULT_MIN_FEATURE_FILE_SIZE,
        }
    }
}

impl SearchOptions {
    /// Whether to search subdirectories of the root. Symlinked directories are never followed.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Replace the extensions of files that are searched. A leading dot is optional and case is
    /// ignored.
    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    /// Videos whose features score at least this much are grouped together.
    ///
    /// # Panics
    /// If `threshold` is not in (0, 1].
    #[must_use]
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        assert!(
            threshold > 0.0 && threshold <= 1.0,
            "similarity threshold must be in (0, 1], got {threshold}"
        );
        self.similarity_threshold = threshold;
        self
    }

    /// Files smaller than this many bytes are ignored by
    /// [`find_duplicate_videos_with_features`].
    #[must_use]
    pub fn min_feature_file_size(mut self, bytes: u64) -> Self {
        self.min_feature_file_size = bytes;
        self
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// The extensions that are searched, lowercase and without a leading dot.
    pub fn video_extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn min_size(&self) -> u64 {
        self.min_feature_file_size
    }
}

fn absolute_root(root: &Path) -> Option<PathBuf> {
    let root = match std::path::absolute(root) {
        Ok(root) => root,
        Err(e) => {
            warn!(target: "dup_search", "Cannot resolve {}: {e}", root.display());
            return None;
        }
    };

    if root.is_dir() {
        Some(root)
    } else {
        warn!(target: "dup_search", "{} is not a directory", root.display());
        None
    }
}

/// Find groups of byte-identical videos under `root`.
///
/// Files are first grouped by size, then each group of same-sized files is hashed. Files that
/// cannot be read are skipped. A `root` that does not exist or is not a directory gives an empty
/// result.
///
/// If the search is stopped through `hooks` while files are still being discovered, the result is
/// empty. If it is stopped later, the groups of every fully hashed size are returned.
///
/// Groups are sorted by size, then digest, then first path.
pub fn find_duplicate_videos(
    root: impl AsRef<Path>,
    options: &SearchOptions,
    hooks: &mut ScanHooks,
) -> Vec<DuplicateGroup> {
    hooks.report(0);

    let Some(root) = absolute_root(root.as_ref()) else {
        hooks.finish();
        return vec![];
    };

    let Some(paths) = enumerate_videos(&root, options, hooks) else {
        hooks.finish();
        return vec![];
    };
    hooks.report(PROGRESS_ENUMERATED);

    let Some(candidates) =
        stat_candidates(paths, 0, hooks, (PROGRESS_ENUMERATED, PROGRESS_STATTED))
    else {
        hooks.finish();
        return vec![];
    };

    let buckets = bucket_by_size(candidates);
    let total = bucketed_file_count(&buckets);
    hooks.report(PROGRESS_STATTED);
    debug!(
        target: "dup_search",
        "Hashing {total} files in {} size buckets",
        buckets.len()
    );

    let mut groups = vec![];
    let mut done = 0usize;

    'buckets: for (size, paths) in buckets {
        let mut by_digest = BTreeMap::<ContentDigest, Vec<PathBuf>>::new();

        for src_path in paths {
            if hooks.should_stop() {
                info!(target: "dup_search", "Search stopped, returning completed results");
                break 'buckets;
            }

            match hash_file(&src_path) {
                Ok(digest) => by_digest.entry(digest).or_default().push(src_path),
                Err(e) => warn!(target: "dup_search", "Skipping {}: {e}", src_path.display()),
            }

            done += 1;
            let fraction = done as f64 / total as f64;
            hooks.report_between(PROGRESS_STATTED, PROGRESS_PROCESSED, fraction);
        }

        groups.extend(by_digest.into_iter().filter_map(|(digest, files)| {
            DuplicateGroup::from_hash_subgroup(size, digest, files, options.threshold())
                .into_emittable()
                .ok()
        }));
    }

    sort_groups(&mut groups);
    info!(target: "dup_search", "Found {} duplicate groups", groups.len());
    hooks.finish();
    groups
}

/// Find groups of identical and near-identical videos under `root`.
///
/// As [`find_duplicate_videos`], except that files smaller than
/// [`SearchOptions::min_feature_file_size`] are ignored, and each file's features are extracted with
/// `extractor`. Within one size, groups of byte-identical files are then merged when any pair of
/// their features scores at least [`SearchOptions::similarity_threshold`]. Files whose features are
/// unavailable can still be grouped by content.
///
/// Sizes are processed from largest to smallest. If the search is stopped, the groups of every
/// fully processed size are returned. Groups are sorted by size, then digest, then first path.
pub fn find_duplicate_videos_with_features(
    root: impl AsRef<Path>,
    options: &SearchOptions,
    extractor: &dyn FeatureExtractor,
    hooks: &mut ScanHooks,
) -> Vec<DuplicateGroup> {
    hooks.report(0);

    let Some(root) = absolute_root(root.as_ref()) else {
        hooks.finish();
        return vec![];
    };

    let Some(paths) = enumerate_videos(&root, options, hooks) else {
        hooks.finish();
        return vec![];
    };

    let floor = options.min_size();
    let Some(candidates) = stat_candidates(paths, floor, hooks, (0, PROGRESS_ENUMERATED)) else {
        hooks.finish();
        return vec![];
    };

    let buckets = bucket_by_size(candidates);
    let total = bucketed_file_count(&buckets) as f64;
    hooks.report(PROGRESS_ENUMERATED);
    debug!(
        target: "dup_search",
        "Extracting features from {total} files in {} size buckets",
        buckets.len()
    );

    let mut groups = vec![];
    let mut done = 0.0;

    'buckets: for (size, paths) in buckets.into_iter().rev() {
        let mut by_digest = BTreeMap::<ContentDigest, DuplicateGroup>::new();

        for src_path in paths {
            if hooks.should_stop() {
                info!(target: "dup_search", "Search stopped, returning completed results");
                break 'buckets;
            }

            match hash_file(&src_path) {
                Ok(digest) => {
                    let features = extractor.extract(&src_path, &mut |fraction| {
                        let fraction = (done + fraction.clamp(0.0, 1.0)) / total;
                        hooks.report_between(PROGRESS_ENUMERATED, PROGRESS_PROCESSED, fraction);
                    });
                    if features.is_none() {
                        debug!(
                            target: "dup_search",
                            "No features for {}, grouping by content only",
                            src_path.display()
                        );
                    }

                    by_digest
                        .entry(digest)
                        .or_insert_with(|| DuplicateGroup::new(size, digest, options.threshold()))
                        .add_file_with_features(src_path, features);
                }
                Err(e) => warn!(target: "dup_search", "Skipping {}: {e}", src_path.display()),
            }

            done += 1.0;
            hooks.report_between(PROGRESS_ENUMERATED, PROGRESS_PROCESSED, done / total);
        }

        let units = by_digest.into_values().collect::<Vec<_>>();
        groups.extend(
            merge_similar_groups(units)
                .into_iter()
                .filter_map(|group| group.into_emittable().ok()),
        );
    }

    sort_groups(&mut groups);
    info!(target: "dup_search", "Found {} duplicate groups", groups.len());
    hooks.finish();
    groups
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extension_normalization() {
        let opts = SearchOptions::default().extensions([".MKV", " webm ", "", "."]);
        assert_eq!(opts.video_extensions(), ["mkv", "webm"]);
    }

    #[test]
    fn test_defaults() {
        let opts = SearchOptions::default();
        assert!(opts.is_recursive());
        assert_eq!(opts.threshold(), 0.95);
        assert_eq!(opts.min_size(), 10 * 1024 * 1024);
        assert_eq!(opts.video_extensions().len(), DEFAULT_VIDEO_EXTENSIONS.len());
    }

    #[test]
    #[should_panic]
    fn test_zero_threshold_is_rejected() {
        let _opts = SearchOptions::default().similarity_threshold(0.0);
    }

    #[test]
    fn test_missing_root_gives_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut seen = vec![];
        let mut hooks = ScanHooks::new().on_progress(|pct| seen.push(pct));

        let opts = SearchOptions::default();
        let got = find_duplicate_videos(dir.path().join("nope"), &opts, &mut hooks);
        drop(hooks);

        assert!(got.is_empty());
        assert_eq!(seen, vec![0, 100]);
    }
}
