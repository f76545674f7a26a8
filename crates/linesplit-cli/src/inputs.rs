//! Resolution of command-line inputs into source files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Source files to process, plus inputs skipped because they look like
/// output of an earlier run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResolvedInputs {
    pub files: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Expand `inputs` into source files.
///
/// Glob patterns are expanded; directories contribute their direct regular
/// files in name order. A literal path is kept even if it does not exist so
/// that its failure shows up in the file's report. Any path containing
/// `marker` is skipped, and repeated paths are kept once.
pub fn resolve(inputs: &[String], marker: &str) -> anyhow::Result<ResolvedInputs> {
    let mut candidates = Vec::new();
    for input in inputs {
        if is_pattern(input) {
            let matches =
                glob::glob(input).with_context(|| format!("invalid glob pattern {input:?}"))?;
            for entry in matches {
                match entry {
                    Ok(path) => expand(path, &mut candidates),
                    Err(e) => warn!(pattern = %input, error = %e, "unreadable glob match"),
                }
            }
        } else {
            expand(PathBuf::from(input), &mut candidates);
        }
    }

    let mut resolved = ResolvedInputs::default();
    let mut seen = HashSet::new();
    for path in candidates {
        if path.to_string_lossy().contains(marker) {
            debug!(path = %path.display(), "skipping working set path");
            resolved.skipped.push(path);
        } else if seen.insert(path.clone()) {
            resolved.files.push(path);
        }
    }
    Ok(resolved)
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn expand(path: PathBuf, out: &mut Vec<PathBuf>) {
    if path.is_dir() {
        out.extend(dir_files(&path));
    } else {
        out.push(path);
    }
}

fn dir_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot list directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, "x\n").unwrap();
    }

    fn arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn glob_expands_and_skips_marker() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.txt"));
        touch(&dir.path().join("b.txt"));
        fs::create_dir(dir.path().join("a.txt-split")).unwrap();
        touch(&dir.path().join("a.txt-split").join("original"));

        let pattern = arg(&dir.path().join("*"));
        let resolved = resolve(&[pattern], "-split").unwrap();
        assert_eq!(
            resolved.files,
            vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
        );
        assert_eq!(resolved.skipped.len(), 1);
    }

    #[test]
    fn directory_contributes_direct_files_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("z.txt"));
        touch(&dir.path().join("m.txt"));
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested").join("deep.txt"));

        let resolved = resolve(&[arg(dir.path())], "-split").unwrap();
        assert_eq!(
            resolved.files,
            vec![dir.path().join("m.txt"), dir.path().join("z.txt")]
        );
    }

    #[test]
    fn missing_literal_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.txt");
        let resolved = resolve(&[arg(&missing)], "-split").unwrap();
        assert_eq!(resolved.files, vec![missing]);
    }

    #[test]
    fn unmatched_glob_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(&[arg(&dir.path().join("*.none"))], "-split").unwrap();
        assert!(resolved.files.is_empty());
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        touch(&a);
        touch(&b);
        let resolved = resolve(&[arg(&b), arg(&dir.path().join("*.txt")), arg(&a)], "-split").unwrap();
        assert_eq!(resolved.files, vec![b, a]);
    }

    #[test]
    fn literal_marker_path_is_skipped() {
        let resolved = resolve(&["data.txt-split-1/original".to_string()], "-split").unwrap();
        assert!(resolved.files.is_empty());
        assert_eq!(resolved.skipped, vec![PathBuf::from("data.txt-split-1/original")]);
    }

    #[test]
    fn bad_pattern_is_error() {
        assert!(resolve(&["[unclosed".to_string()], "-split").is_err());
    }
}
