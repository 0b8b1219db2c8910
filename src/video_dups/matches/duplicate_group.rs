use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{ContentDigest, VideoFeatures};

/// A group of duplicate videos found by [`crate::find_duplicate_videos`] or
/// [`crate::find_duplicate_videos_with_features`].
///
/// Every group returned by a search holds at least two files. Files are kept in [`Path`] order,
/// which compares paths component by component.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct DuplicateGroup {
    size: u64,
    digest: ContentDigest,
    files: BTreeSet<PathBuf>,
    features: BTreeMap<PathBuf, Option<VideoFeatures>>,
    similarity_threshold: f64,
    hash_subgroups: usize,
}

/// Returned when a group would be emitted with fewer than two files.
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Debug, Hash)]
pub struct TooFewEntries();

impl DuplicateGroup {
    /// Create an empty group for files of `size` bytes whose contents hash to `digest`.
    pub fn new(size: u64, digest: ContentDigest, similarity_threshold: f64) -> Self {
        Self {
            size,
            digest,
            files: BTreeSet::new(),
            features: BTreeMap::new(),
            similarity_threshold,
            hash_subgroups: 1,
        }
    }

    pub(crate) fn from_hash_subgroup(
        size: u64,
        digest: ContentDigest,
        files: impl IntoIterator<Item = PathBuf>,
        similarity_threshold: f64,
    ) -> Self {
        let mut ret = Self::new(size, digest, similarity_threshold);
        for src_path in files {
            ret.add_file_with_features(src_path, None);
        }
        ret
    }

    /// Add one file, with its features if they are available. Adding a path that is already
    /// present only fills in features that were missing.
    pub fn add_file_with_features(&mut self, src_path: PathBuf, features: Option<VideoFeatures>) {
        let slot = self.features.entry(src_path.clone()).or_default();
        if slot.is_none() {
            *slot = features;
        }
        self.files.insert(src_path);
    }

    /// True when any member with features scores at least the group's similarity threshold against
    /// `features`.
    #[must_use]
    pub fn is_similar(&self, features: &VideoFeatures) -> bool {
        self.present_features()
            .any(|own| own.similarity(features) >= self.similarity_threshold)
    }

    /// True when any pair of features, one from each group, scores at least this group's threshold.
    pub(crate) fn is_similar_group(&self, other: &Self) -> bool {
        other.present_features().any(|theirs| self.is_similar(theirs))
    }

    /// The mean similarity over every pair of members that have features.
    ///
    /// 1.0 for a group with fewer than two files. 0.0 when fewer than two members have features.
    #[must_use]
    pub fn group_similarity(&self) -> f64 {
        if self.files.len() < 2 {
            return 1.0;
        }

        let scores = self
            .present_features()
            .tuple_combinations()
            .map(|(a, b)| a.similarity(b))
            .collect::<Vec<_>>();

        if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }

    /// Take every file and feature set of `other`.
    pub(crate) fn absorb(&mut self, other: DuplicateGroup) {
        for (src_path, features) in other.features {
            self.add_file_with_features(src_path, features);
        }
        self.files.extend(other.files);
        self.hash_subgroups += other.hash_subgroups;
    }

    /// Fails unless the group holds at least two files.
    pub(crate) fn into_emittable(self) -> Result<Self, TooFewEntries> {
        (self.files.len() >= 2).then_some(self).ok_or(TooFewEntries())
    }

    /// The number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// The size in bytes shared by every file in the group.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The content digest of the group's files. For a group that merged several near-duplicates
    /// this is the digest of the first subgroup, and not every file has it.
    #[must_use]
    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    /// The paths of the files in this group, in order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// The features of a member, if they were extracted.
    #[must_use]
    pub fn features(&self, src_path: &Path) -> Option<&VideoFeatures> {
        self.features.get(src_path).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    /// True when this group joined files with different contents because their features matched.
    #[must_use]
    pub fn is_feature_merged(&self) -> bool {
        self.hash_subgroups > 1
    }

    fn present_features(&self) -> impl Iterator<Item = &VideoFeatures> + Clone {
        self.features.values().flatten()
    }

    fn sort_key(&self) -> (u64, ContentDigest, Option<&PathBuf>) {
        (self.size, self.digest, self.files.first())
    }
}

/// Order groups by size, then digest, then first path.
pub(crate) fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::*;
    use crate::video_dups::video_features::test_util::*;

    fn digest(seed: &[u8]) -> ContentDigest {
        blake3::hash(seed).into()
    }

    #[test]
    fn test_single_file_groups_are_not_emittable() {
        let one = DuplicateGroup::from_hash_subgroup(10, digest(b"a"), [PathBuf::from("a")], 0.9);
        assert_eq!(one.into_emittable(), Err(TooFewEntries()));

        let two = DuplicateGroup::from_hash_subgroup(
            10,
            digest(b"a"),
            [PathBuf::from("b"), PathBuf::from("a")],
            0.9,
        );
        let two = two.into_emittable().unwrap();
        assert_eq!(
            two.files().collect::<Vec<_>>(),
            vec![Path::new("a"), Path::new("b")]
        );
        assert!(!two.is_feature_merged());
    }

    #[test]
    fn test_similarity_helpers() {
        let mut rng = StdRng::seed_from_u64(10);
        let base = random_features(&mut rng, 300.0, 6);
        let near = perturbed(&mut rng, &base, 0.001);
        let unrelated = random_features(&mut rng, 30.0, 6);

        let mut group = DuplicateGroup::new(10, digest(b"x"), 0.95);
        assert_eq!(group.group_similarity(), 1.0);

        group.add_file_with_features(PathBuf::from("base"), Some(base));
        assert!(group.is_similar(&near));
        assert!(!group.is_similar(&unrelated));

        group.add_file_with_features(PathBuf::from("no_features"), None);
        assert_eq!(group.group_similarity(), 0.0);

        group.add_file_with_features(PathBuf::from("near"), Some(near));
        assert!(group.group_similarity() > 0.95);
        assert!(group.features(Path::new("near")).is_some());
        assert!(group.features(Path::new("no_features")).is_none());
    }

    #[test]
    fn test_absorb_counts_subgroups() {
        let mut a = DuplicateGroup::from_hash_subgroup(10, digest(b"a"), [PathBuf::from("a")], 0.9);
        let b = DuplicateGroup::from_hash_subgroup(10, digest(b"b"), [PathBuf::from("b")], 0.9);

        a.absorb(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.digest(), digest(b"a"));
        assert!(a.is_feature_merged());
    }

    #[test]
    fn test_sort_order() {
        let group = |size, d: &[u8], first: &str| {
            DuplicateGroup::from_hash_subgroup(
                size,
                digest(d),
                [PathBuf::from(first), PathBuf::from("zzz")],
                0.9,
            )
        };

        let (lo, hi) = if digest(b"p") < digest(b"q") {
            (b"p", b"q")
        } else {
            (b"q", b"p")
        };

        let mut groups = vec![
            group(20, lo, "a"),
            group(10, hi, "a"),
            group(10, lo, "b"),
            group(10, lo, "a"),
        ];
        sort_groups(&mut groups);

        let keys = groups
            .iter()
            .map(|g| (g.size(), g.digest(), g.files().next().map(Path::to_path_buf)))
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                (10, digest(lo), Some(PathBuf::from("a"))),
                (10, digest(lo), Some(PathBuf::from("b"))),
                (10, digest(hi), Some(PathBuf::from("a"))),
                (20, digest(lo), Some(PathBuf::from("a"))),
            ]
        );
    }
}
