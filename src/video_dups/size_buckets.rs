use std::{collections::BTreeMap, path::PathBuf};

use super::file_discovery::VideoCandidate;

/// Files keyed by their exact size in bytes. Every bucket holds at least two files.
pub(crate) type SizeBuckets = BTreeMap<u64, Vec<PathBuf>>;

/// Partition candidates by exact size, dropping sizes that only one file has. Files of
/// different sizes can never be byte-identical, and near-duplicate search is also limited to
/// files of the same size.
pub(crate) fn bucket_by_size(candidates: impl IntoIterator<Item = VideoCandidate>) -> SizeBuckets {
    let mut buckets = SizeBuckets::new();
    for VideoCandidate { path, size } in candidates {
        buckets.entry(size).or_default().push(path);
    }

    buckets.retain(|_size, paths| paths.len() >= 2);
    buckets
}

pub(crate) fn bucketed_file_count(buckets: &SizeBuckets) -> usize {
    buckets.values().map(Vec::len).sum()
}

#[cfg(test)]
mod test {
    use super::*;

    fn cand(path: &str, size: u64) -> VideoCandidate {
        VideoCandidate {
            path: PathBuf::from(path),
            size,
        }
    }

    #[test]
    fn test_singletons_are_dropped() {
        let buckets = bucket_by_size([
            cand("a", 10),
            cand("b", 20),
            cand("c", 10),
            cand("d", 30),
            cand("e", 30),
            cand("f", 30),
        ]);

        assert_eq!(buckets.keys().copied().collect::<Vec<_>>(), vec![10, 30]);
        assert_eq!(buckets[&10], vec![PathBuf::from("a"), PathBuf::from("c")]);
        assert_eq!(bucketed_file_count(&buckets), 5);
    }

    #[test]
    fn test_no_shared_sizes() {
        let buckets = bucket_by_size([cand("a", 1), cand("b", 2)]);
        assert!(buckets.is_empty());
    }
}
