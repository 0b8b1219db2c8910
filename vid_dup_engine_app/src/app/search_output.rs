use std::{io::Write, path::Path};

use serde::Serialize;
use vid_dup_engine::DuplicateGroup;

use super::OutputFormat;

#[derive(Debug, Clone)]
pub struct SearchOutput {
    dup_groups: Vec<DuplicateGroup>,
}

// Struct only exists to be serialized.
#[derive(Serialize)]
struct JsonGroup<'a> {
    size: u64,
    digest: String,
    files: Vec<&'a Path>,
    similarity: Option<f64>,
}

impl SearchOutput {
    pub fn new(dup_groups: Vec<DuplicateGroup>) -> Self {
        Self { dup_groups }
    }

    pub fn len(&self) -> usize {
        self.dup_groups.len()
    }

    pub fn dup_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.dup_groups.iter()
    }

    pub fn write(&self, format: OutputFormat, out: &mut impl Write) -> std::io::Result<()> {
        match format {
            OutputFormat::Normal => self.write_normal(out),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &self.json_groups())?;
                writeln!(out)
            }
        }
    }

    fn write_normal(&self, out: &mut impl Write) -> std::io::Result<()> {
        for group in self.dup_groups() {
            write!(out, "{} bytes, {}", group.size(), group.digest())?;
            if group.is_feature_merged() {
                write!(out, ", similarity {:.3}", group.group_similarity())?;
            }
            writeln!(out)?;

            for video in group.files() {
                writeln!(out, "{}", video.display())?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn json_groups(&self) -> Vec<JsonGroup<'_>> {
        self.dup_groups()
            .map(|group| JsonGroup {
                size: group.size(),
                digest: group.digest().to_hex(),
                files: group.files().collect(),
                similarity: group
                    .is_feature_merged()
                    .then(|| group.group_similarity()),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use tempfile::TempDir;
    use vid_dup_engine::{find_duplicate_videos, ScanHooks, SearchOptions};

    use super::*;

    fn two_copies() -> (TempDir, Vec<DuplicateGroup>) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"same bytes").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"same bytes").unwrap();

        let opts = SearchOptions::default();
        let groups = find_duplicate_videos(dir.path(), &opts, &mut ScanHooks::new());
        (dir, groups)
    }

    #[test]
    fn test_normal_output() {
        let (dir, groups) = two_copies();
        let output = SearchOutput::new(groups);
        assert_eq!(output.len(), 1);

        let mut buf = vec![];
        output.write(OutputFormat::Normal, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines = text.lines().collect::<Vec<_>>();

        assert!(lines[0].starts_with("10 bytes, "));
        assert!(!lines[0].contains("similarity"));
        assert_eq!(lines[1], dir.path().join("a.mp4").display().to_string());
        assert_eq!(lines[2], dir.path().join("b.mp4").display().to_string());
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_json_output() {
        let (dir, groups) = two_copies();
        let digest = groups[0].digest().to_hex();
        let output = SearchOutput::new(groups);

        let mut buf = vec![];
        output.write(OutputFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let group = &value[0];
        assert_eq!(group["size"], 10);
        assert_eq!(group["digest"], digest.as_str());
        assert!(group["similarity"].is_null());

        let files = group["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| PathBuf::from(f.as_str().unwrap()))
            .collect::<Vec<_>>();
        assert_eq!(files, vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")]);
    }

    #[test]
    fn test_empty_json_output_is_an_empty_array() {
        let mut buf = vec![];
        SearchOutput::new(vec![])
            .write(OutputFormat::Json, &mut buf)
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim(), "[]");
    }
}
