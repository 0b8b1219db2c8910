use log::debug;

use crate::{definitions::MAX_MERGE_SIZE_DIFF, DuplicateGroup};

/// True when the smaller size is within 10% of the larger.
pub(crate) fn sizes_within_range(a: u64, b: u64) -> bool {
    let larger = a.max(b);
    if larger == 0 {
        return true;
    }

    (larger - a.min(b)) as f64 / larger as f64 <= MAX_MERGE_SIZE_DIFF
}

/// Merge units whose files look alike.
///
/// Each unit is compared with every later unit. When a later unit matches it is absorbed and
/// removed, and the same unit is compared against whichever unit slid into the freed slot, so one
/// unit can absorb several others in a single pass.
pub(crate) fn merge_similar_groups(mut units: Vec<DuplicateGroup>) -> Vec<DuplicateGroup> {
    let mut i = 0;
    while i < units.len() {
        let mut j = i + 1;
        while j < units.len() {
            let mergeable = sizes_within_range(units[i].size(), units[j].size())
                && units[i].is_similar_group(&units[j]);

            if mergeable {
                let absorbed = units.remove(j);
                debug!(
                    target: "group_merge",
                    "Merging {} files with digest {} into group with digest {}",
                    absorbed.len(),
                    absorbed.digest(),
                    units[i].digest()
                );
                units[i].absorb(absorbed);
            } else {
                j += 1;
            }
        }
        i += 1;
    }

    units
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use rand::prelude::*;

    use super::*;
    use crate::{video_dups::video_features::test_util::*, ContentDigest, VideoFeatures};

    fn unit(name: &str, size: u64, features: Option<VideoFeatures>) -> DuplicateGroup {
        let digest = ContentDigest::from(blake3::hash(name.as_bytes()));
        let mut ret = DuplicateGroup::new(size, digest, 0.95);
        ret.add_file_with_features(PathBuf::from(name), features);
        ret
    }

    #[test]
    fn test_size_range() {
        assert!(sizes_within_range(100, 100));
        assert!(sizes_within_range(100, 90));
        assert!(!sizes_within_range(100, 89));
        assert!(sizes_within_range(0, 0));
        assert!(!sizes_within_range(0, 1));
    }

    #[test]
    fn test_one_unit_absorbs_several() {
        let mut rng = StdRng::seed_from_u64(20);
        let base = random_features(&mut rng, 100.0, 6);
        let other = random_features(&mut rng, 100.0, 6);

        let units = vec![
            unit("a", 1000, Some(base.clone())),
            unit("b", 1000, Some(other.clone())),
            unit("c", 1000, Some(perturbed(&mut rng, &base, 0.0005))),
            unit("d", 1000, None),
            unit("e", 1000, Some(perturbed(&mut rng, &base, 0.0005))),
            unit("f", 1000, Some(perturbed(&mut rng, &other, 0.0005))),
        ];

        let merged = merge_similar_groups(units);
        let names = merged
            .iter()
            .map(|g| g.files().map(|p| p.to_string_lossy().to_string()).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        assert_eq!(names, vec![vec!["a", "c", "e"], vec!["b", "f"], vec!["d"]]);
        assert!(merged[0].is_feature_merged());
    }

    #[test]
    fn test_sizes_too_far_apart_never_merge() {
        let mut rng = StdRng::seed_from_u64(21);
        let base = random_features(&mut rng, 100.0, 6);

        let units = vec![unit("a", 1000, Some(base.clone())), unit("b", 500, Some(base))];
        assert_eq!(merge_similar_groups(units).len(), 2);
    }
}
