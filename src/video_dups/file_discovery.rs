use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};
use walkdir::{DirEntry, WalkDir};

use crate::{ScanHooks, SearchOptions};

/// A file that passed the extension filter, with its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VideoCandidate {
    pub path: PathBuf,
    pub size: u64,
}

pub(crate) fn has_video_extension(src_path: &Path, extensions: &[String]) -> bool {
    src_path.extension().is_some_and(|ext| {
        extensions
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
}

// Symlinked files count as files. Symlinked directories are never descended into
// because the walker does not follow links.
fn is_file(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
    } else {
        entry.file_type().is_file()
    }
}

/// Collect every file under `root` with a video extension, in file name order.
///
/// Returns `None` if the search was stopped. Entries that cannot be read are skipped.
pub(crate) fn enumerate_videos(
    root: &Path,
    options: &SearchOptions,
    hooks: &ScanHooks,
) -> Option<Vec<PathBuf>> {
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    if !options.is_recursive() {
        walker = walker.max_depth(1);
    }

    let extensions = options.video_extensions();
    let mut found = vec![];
    for entry in walker {
        if hooks.should_stop() {
            info!(target: "file_discovery", "Search stopped during file discovery");
            return None;
        }

        match entry {
            Ok(entry) => {
                if is_file(&entry) && has_video_extension(entry.path(), extensions) {
                    trace!(target: "file_discovery", "Found {}", entry.path().display());
                    found.push(entry.into_path());
                }
            }
            Err(e) => debug!(target: "file_discovery", "Skipping unreadable entry: {e}"),
        }
    }

    debug!(
        target: "file_discovery",
        "Found {} videos under {}",
        found.len(),
        root.display()
    );
    Some(found)
}

/// Read the size of each path, dropping files that cannot be stat'ed or are smaller than
/// `min_size`. Progress is reported inside `[start, end]`.
///
/// Returns `None` if the search was stopped.
pub(crate) fn stat_candidates(
    paths: Vec<PathBuf>,
    min_size: u64,
    hooks: &mut ScanHooks,
    (start, end): (u8, u8),
) -> Option<Vec<VideoCandidate>> {
    let total = paths.len();
    let mut candidates = Vec::with_capacity(total);

    for (i, path) in paths.into_iter().enumerate() {
        if hooks.should_stop() {
            info!(target: "file_discovery", "Search stopped while reading file sizes");
            return None;
        }

        match fs::metadata(&path) {
            Ok(meta) if meta.len() >= min_size => candidates.push(VideoCandidate {
                path,
                size: meta.len(),
            }),
            Ok(meta) => trace!(
                target: "file_discovery",
                "Skipping {}: {} bytes is below the size floor",
                path.display(),
                meta.len()
            ),
            Err(e) => debug!(
                target: "file_discovery",
                "Skipping {}: {e}",
                path.display()
            ),
        }

        hooks.report_between(start, end, (i + 1) as f64 / total as f64);
    }

    Some(candidates)
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, vec![0u8; len]).unwrap();
        path
    }

    #[test]
    fn test_extension_matching_ignores_case() {
        let exts = SearchOptions::default().video_extensions().to_vec();

        assert!(has_video_extension(Path::new("a/b.MP4"), &exts));
        assert!(has_video_extension(Path::new("clip.m2ts"), &exts));
        assert!(!has_video_extension(Path::new("notes.txt"), &exts));
        assert!(!has_video_extension(Path::new("mp4"), &exts));
    }

    #[test]
    fn test_enumerate_respects_recursion() {
        let dir = TempDir::new().unwrap();
        let top = touch(dir.path(), "top.mp4", 1);
        let nested = touch(dir.path(), "sub/nested.mkv", 1);
        touch(dir.path(), "readme.txt", 1);

        let hooks = ScanHooks::new();

        let recursive = enumerate_videos(dir.path(), &SearchOptions::default(), &hooks).unwrap();
        assert_eq!(recursive, vec![nested, top.clone()]);

        let flat_opts = SearchOptions::default().recursive(false);
        let flat = enumerate_videos(dir.path(), &flat_opts, &hooks).unwrap();
        assert_eq!(flat, vec![top]);
    }

    #[test]
    fn test_enumerate_stops_when_asked() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.mp4", 1);

        let hooks = ScanHooks::new().stop_when(|| true);
        assert_eq!(
            enumerate_videos(dir.path(), &SearchOptions::default(), &hooks),
            None
        );
    }

    #[test]
    fn test_stat_applies_size_floor() {
        let dir = TempDir::new().unwrap();
        let small = touch(dir.path(), "small.mp4", 10);
        let big = touch(dir.path(), "big.mp4", 100);
        let missing = dir.path().join("missing.mp4");

        let last = Cell::new(0);
        let mut hooks = ScanHooks::new().on_progress(|pct| last.set(pct));
        let paths = vec![small, big.clone(), missing];
        let got = stat_candidates(paths, 50, &mut hooks, (5, 40)).unwrap();
        drop(hooks);

        assert_eq!(got, vec![VideoCandidate { path: big, size: 100 }]);
        assert_eq!(last.get(), 40);
    }
}
